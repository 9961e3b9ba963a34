//! Policy metrics, enabled by the `metrics` feature.
//!
//! [`ClockPro`](crate::policy::clock_pro::ClockPro) bumps plain counters in
//! [`ClockProMetrics`](metrics_impl::ClockProMetrics) as the hands run;
//! [`MetricsSnapshotProvider`](traits::MetricsSnapshotProvider) adds the
//! queue gauges and [`PrometheusTextExporter`](exporter::PrometheusTextExporter)
//! publishes the result.

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
