//! `catalogd` — stdio transport for the catalog core.
//!
//! Reads length-delimited JSON request frames from stdin, dispatches each
//! to the tool registry, and writes a length-delimited JSON response frame
//! to stdout. Background loops (auto-save, retention sweep, metrics
//! snapshot) run alongside on a shared cancellation token and are asked to
//! finish in-flight work before the process exits.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use catalog::{CatalogConfig, CatalogService, ToolRegistry};
use catalog_quality::{HeuristicScorer, ScorerChain};
use catalog_retention::{Sweeper, SweeperConfig};
use catalog_store::open_store;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(serde::Deserialize)]
struct RequestFrame {
    id: serde_json::Value,
    tool: String,
    #[serde(default)]
    input: serde_json::Value,
}

#[derive(serde::Serialize)]
struct ResponseFrame {
    id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<catalog::FailureResult>,
}

fn init_tracing(config: &CatalogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_frame<R: tokio::io::AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    writer.write_all(&(body.len() as u32).to_be_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

fn spawn_auto_save(
    service: Arc<CatalogService>,
    index_path: PathBuf,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    if let Err(e) = service.save_vector_index(&index_path) {
                        error!(error = %e, "final vector index save failed on shutdown");
                    }
                    info!("auto-save loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = service.save_vector_index(&index_path) {
                        warn!(error = %e, "periodic vector index save failed");
                    }
                }
            }
        }
    })
}

fn spawn_metrics_snapshot(
    service: Arc<CatalogService>,
    snapshot_path: PathBuf,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(300));
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    if let Err(e) = service.save_metrics_snapshot(&snapshot_path) {
                        error!(error = %e, "final metrics snapshot failed on shutdown");
                    }
                    info!("metrics snapshot loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = service.save_metrics_snapshot(&snapshot_path) {
                        warn!(error = %e, "periodic metrics snapshot failed");
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CatalogConfig::load().context("loading catalog configuration")?;
    init_tracing(&config);

    let store = open_store(&config.storage.store).context("opening element store")?;
    let scorer_chain = ScorerChain::new(vec![Box::new(HeuristicScorer::new())]);
    let service = Arc::new(
        CatalogService::new(config.clone(), store, scorer_chain).context("building catalog service")?,
    );
    let registry = Arc::new(ToolRegistry::with_defaults());

    let shutdown = CancellationToken::new();
    let data_root = config.storage.store.resolve_data_root();
    let index_path = data_root.join(&config.vector.index_path);
    let metrics_path = data_root.join("metrics-snapshot.json");

    let mut handles = Vec::new();
    handles.push(spawn_auto_save(
        service.clone(),
        index_path,
        shutdown.clone(),
    ));
    handles.push(spawn_metrics_snapshot(
        service.clone(),
        metrics_path,
        shutdown.clone(),
    ));

    let sweeper_config = SweeperConfig {
        enabled: config.retention.auto_cleanup,
        interval: config.retention.sweeper_interval(),
    };
    let sweeper = Arc::new(Sweeper::new(
        sweeper_config,
        service.retention_policy(),
        service.clone(),
    ));
    if let Some(handle) = sweeper.spawn(shutdown.clone()) {
        handles.push(handle);
    }

    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        shutdown_signal.cancel();
    });

    let mut stdin = tokio::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("stdio loop shutting down");
                break;
            }
            frame = read_frame(&mut stdin) => {
                let Some(body) = frame? else {
                    info!("stdin closed, shutting down");
                    shutdown.cancel();
                    break;
                };
                let request: RequestFrame = match serde_json::from_slice(&body) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "malformed request frame");
                        continue;
                    }
                };

                let start = std::time::Instant::now();
                let dispatch_result = registry.dispatch(&service, &request.tool, request.input).await;
                service.record_metric(request.tool.clone(), start.elapsed().as_secs_f64() * 1000.0);

                let response = match dispatch_result {
                    Ok(result) => ResponseFrame { id: request.id, result: Some(result), error: None },
                    Err(failure) => ResponseFrame { id: request.id, result: None, error: Some(failure) },
                };
                let encoded = serde_json::to_vec(&response)?;
                write_frame(&mut stdout, &encoded)?;
            }
        }
    }

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
