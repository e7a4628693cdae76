//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_allocation_retry, record_http_request,
    record_registration, PrometheusMetrics, RegistrationOutcome,
};
