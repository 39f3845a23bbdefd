//! Ring log buffer and performance metrics dashboard.

pub mod error;
mod log_buffer;
mod metrics;

pub use error::{ObservabilityError, ObservabilityResult};
pub use log_buffer::{LogEntry, LogFilter, LogLevel, RingLogBuffer};
pub use metrics::{Dashboard, OperationBreakdown, PerformanceMetrics, Sample};
