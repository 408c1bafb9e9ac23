//! # krympa-telemetry
//!
//! Observability layer for the squash harness: structured logging through
//! `tracing` and a prometheus recorder for squash-window statistics.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
