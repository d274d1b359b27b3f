//! Observability: metrics recording and the Prometheus exporter.

pub mod metrics;
