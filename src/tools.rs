use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use catalog_observability::{LogEntry, LogFilter, LogLevel};
use catalog_store::{Element, ElementType, ListFilter};

use crate::error::{CatalogError, FailureResult};
use crate::service::CatalogService;

fn to_value<T: Serialize>(result: T) -> Result<Value, FailureResult> {
    serde_json::to_value(result).map_err(|e| FailureResult {
        kind: "invalid-argument".to_string(),
        message: format!("failed to encode tool result: {e}"),
        suggestion: None,
    })
}

fn from_value<T: for<'de> Deserialize<'de>>(input: Value) -> Result<T, FailureResult> {
    serde_json::from_value(input).map_err(|e| FailureResult {
        kind: "invalid-argument".to_string(),
        message: format!("malformed tool input: {e}"),
        suggestion: Some("check the request shape against the tool's input schema".to_string()),
    })
}

/// One entry in the dynamic dispatch table ("Model tool handlers
/// as a registry of (name, input-decoder, handler) triples populated at
/// startup"). The decoder lives inside `handle` itself via `from_value`, so
/// the registry only needs to look handlers up by name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;
    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult>;
}

#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the core tool surface.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CreateElementHandler));
        registry.register(Box::new(UpdateElementHandler));
        registry.register(Box::new(DeleteElementHandler));
        registry.register(Box::new(GetElementHandler));
        registry.register(Box::new(ListElementsHandler));
        registry.register(Box::new(SearchElementsHandler));
        registry.register(Box::new(SearchCapabilityIndexHandler));
        registry.register(Box::new(FindSimilarCapabilitiesHandler));
        registry.register(Box::new(ListLogsHandler));
        registry.register(Box::new(GetPerformanceDashboardHandler));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn ToolHandler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub async fn dispatch(
        &self,
        service: &CatalogService,
        name: &str,
        input: Value,
    ) -> Result<Value, FailureResult> {
        match self.handlers.get(name) {
            Some(handler) => handler.handle(service, input).await,
            None => Err(FailureResult {
                kind: "not-found".to_string(),
                message: format!("no tool handler registered for \"{name}\""),
                suggestion: None,
            }),
        }
    }
}

// --- create_element -------------------------------------------------------

#[derive(Deserialize)]
struct CreateElementInput {
    element: Element,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct CreateElementOutput {
    id: String,
}

struct CreateElementHandler;

#[async_trait]
impl ToolHandler for CreateElementHandler {
    fn name(&self) -> &str {
        "create_element"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: CreateElementInput = from_value(input)?;
        let created = service
            .create_element(input.element, input.embedding)
            .map_err(CatalogError::into_failure_result)?;
        to_value(CreateElementOutput { id: created.id })
    }
}

// --- update_element -------------------------------------------------------

#[derive(Deserialize)]
struct UpdateElementInput {
    element: Element,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct UpdateElementOutput {
    id: String,
}

struct UpdateElementHandler;

#[async_trait]
impl ToolHandler for UpdateElementHandler {
    fn name(&self) -> &str {
        "update_element"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: UpdateElementInput = from_value(input)?;
        let updated = service
            .update_element(input.element, input.embedding)
            .map_err(CatalogError::into_failure_result)?;
        to_value(UpdateElementOutput { id: updated.id })
    }
}

// --- delete_element ---------------------------------------------------

#[derive(Deserialize)]
struct DeleteElementInput {
    id: String,
}

struct DeleteElementHandler;

#[async_trait]
impl ToolHandler for DeleteElementHandler {
    fn name(&self) -> &str {
        "delete_element"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: DeleteElementInput = from_value(input)?;
        service
            .delete_element(&input.id)
            .map_err(CatalogError::into_failure_result)?;
        to_value(serde_json::json!({ "ok": true }))
    }
}

// --- get_element -----------------------------------------------------

#[derive(Deserialize)]
struct GetElementInput {
    id: String,
}

struct GetElementHandler;

#[async_trait]
impl ToolHandler for GetElementHandler {
    fn name(&self) -> &str {
        "get_element"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: GetElementInput = from_value(input)?;
        let element = service
            .get_element(&input.id)
            .map_err(CatalogError::into_failure_result)?;
        to_value(element)
    }
}

// --- list_elements -----------------------------------------------------

#[derive(Deserialize, Default)]
struct ElementFilterInput {
    element_type: Option<ElementType>,
    active: Option<bool>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

impl From<ElementFilterInput> for ListFilter {
    fn from(input: ElementFilterInput) -> Self {
        ListFilter {
            element_type: input.element_type,
            active: input.active,
            tags: input.tags,
            offset: input.offset,
            limit: input.limit,
        }
    }
}

struct ListElementsHandler;

#[async_trait]
impl ToolHandler for ListElementsHandler {
    fn name(&self) -> &str {
        "list_elements"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: ElementFilterInput = from_value(input)?;
        let elements = service
            .list_elements(&input.into())
            .map_err(CatalogError::into_failure_result)?;
        to_value(elements)
    }
}

// --- search_elements -----------------------------------------------------

#[derive(Deserialize)]
struct SearchElementsInput {
    query: String,
    #[serde(default)]
    filter: ElementFilterInput,
}

struct SearchElementsHandler;

#[async_trait]
impl ToolHandler for SearchElementsHandler {
    fn name(&self) -> &str {
        "search_elements"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: SearchElementsInput = from_value(input)?;
        let elements = service
            .search_elements(&input.query, &input.filter.into())
            .map_err(CatalogError::into_failure_result)?;
        to_value(elements)
    }
}

// --- search_capability_index -----------------------------------------

#[derive(Deserialize)]
struct SearchCapabilityIndexInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

struct SearchCapabilityIndexHandler;

#[async_trait]
impl ToolHandler for SearchCapabilityIndexHandler {
    fn name(&self) -> &str {
        "search_capability_index"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: SearchCapabilityIndexInput = from_value(input)?;
        let hits = service.search_capability_index(&input.query, input.limit);
        to_value(hits)
    }
}

// --- find_similar_capabilities -----------------------------------------

#[derive(Deserialize)]
struct FindSimilarCapabilitiesInput {
    id: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

struct FindSimilarCapabilitiesHandler;

#[async_trait]
impl ToolHandler for FindSimilarCapabilitiesHandler {
    fn name(&self) -> &str {
        "find_similar_capabilities"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: FindSimilarCapabilitiesInput = from_value(input)?;
        let hits = service.find_similar_capabilities(&input.id, input.limit);
        to_value(hits)
    }
}

// --- list_logs -----------------------------------------------------------

#[derive(Deserialize, Default)]
struct ListLogsInput {
    min_level: Option<LogLevel>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    keyword: Option<String>,
    user: Option<String>,
    operation: Option<String>,
    tool: Option<String>,
    limit: Option<usize>,
}

struct ListLogsHandler;

#[async_trait]
impl ToolHandler for ListLogsHandler {
    fn name(&self) -> &str {
        "list_logs"
    }

    async fn handle(&self, service: &CatalogService, input: Value) -> Result<Value, FailureResult> {
        let input: ListLogsInput = from_value(input)?;
        let filter = LogFilter {
            min_level: input.min_level,
            after: input.after,
            before: input.before,
            keyword: input.keyword,
            user: input.user,
            operation: input.operation,
            tool: input.tool,
            limit: input.limit,
        };
        let entries: Vec<LogEntry> = service.list_logs(&filter);
        to_value(entries)
    }
}

// --- get_performance_dashboard -----------------------------------------

struct GetPerformanceDashboardHandler;

#[async_trait]
impl ToolHandler for GetPerformanceDashboardHandler {
    fn name(&self) -> &str {
        "get_performance_dashboard"
    }

    async fn handle(&self, service: &CatalogService, _input: Value) -> Result<Value, FailureResult> {
        to_value(service.get_performance_dashboard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_quality::{HeuristicScorer, ScorerChain};
    use catalog_store::InMemoryElementStore;
    use serde_json::json;

    fn service() -> CatalogService {
        let chain = ScorerChain::new(vec![Box::new(HeuristicScorer::new())]);
        CatalogService::new(
            crate::config::CatalogConfig::default(),
            Box::new(InMemoryElementStore::default()),
            chain,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_returns_not_found() {
        let registry = ToolRegistry::with_defaults();
        let svc = service();
        let err = registry
            .dispatch(&svc, "no_such_tool", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "not-found");
    }

    #[tokio::test]
    async fn create_then_get_element_round_trips() {
        let registry = ToolRegistry::with_defaults();
        let svc = service();
        let element = json!({
            "id": "e1",
            "element_type": "memory",
            "name": "Note",
            "description": "a note",
            "version": "1.0.0",
            "author": "alice",
            "tags": [],
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "active": true,
            "body": { "kind": "memory", "content": "hello" },
        });
        let created = registry
            .dispatch(&svc, "create_element", json!({ "element": element }))
            .await
            .unwrap();
        assert_eq!(created["id"], "e1");

        let fetched = registry
            .dispatch(&svc, "get_element", json!({ "id": "e1" }))
            .await
            .unwrap();
        assert_eq!(fetched["id"], "e1");
    }
}
