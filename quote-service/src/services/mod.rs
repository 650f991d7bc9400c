//! Business services for quote-service.

pub mod audit;
pub mod composer;
pub mod database;
pub mod lifecycle;
pub mod metrics;
pub mod pricing;
pub mod sharing;

pub use audit::{AuditSink, NoopAuditSink, PgAuditSink};
pub use composer::QuoteComposer;
pub use database::Database;
pub use lifecycle::TransitionPolicy;
pub use metrics::{get_metrics, init_metrics};
pub use sharing::SharingGateway;
