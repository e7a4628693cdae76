//! API middleware and extractors

pub mod caller;
pub mod logging;
pub mod metrics;

pub use caller::{extract_bearer_token, RequireCaller};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
