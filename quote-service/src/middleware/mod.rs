pub mod metrics;
pub mod tenant;

pub use metrics::metrics_middleware;
pub use tenant::TenantContext;
