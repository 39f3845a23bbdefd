//! Core retrieval and quality engine for a local AI element catalog.
//!
//! Wires the element store, lexical and vector indices, the quality
//! scoring chain, retention policy, and observability surfaces behind one
//! [`CatalogService`], dispatched through a [`ToolRegistry`].

pub mod config;
pub mod error;
pub mod service;
pub mod tools;

pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult, FailureResult};
pub use service::CatalogService;
pub use tools::{ToolHandler, ToolRegistry};
