//! Observability: compile telemetry and sink abstractions.
//!
//! Counters are side data only. Nothing recorded here feeds back into
//! compilation.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntityCounters, EntitySummary, EventOps, EventReport, EventState};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
