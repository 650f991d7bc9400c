//! Best-effort audit logging for quote actions.
//!
//! The sink is a capability passed into the composer; emission is
//! fire-and-forget and never surfaces into the primary operation.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::postgres::PgPool;
use uuid::Uuid;

/// Action recorded against a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Duplicate,
    StatusUpdate,
    PublicResponse,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Duplicate => "duplicate",
            AuditAction::StatusUpdate => "status_update",
            AuditAction::PublicResponse => "public_response",
        }
    }
}

/// One audit event. `details` carries the operation payload (snapshots,
/// old/new status); `request_metadata` whatever the transport knows.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub owner_id: Uuid,
    pub action: AuditAction,
    pub module: &'static str,
    pub details: serde_json::Value,
    pub request_metadata: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(owner_id: Uuid, action: AuditAction, details: serde_json::Value) -> Self {
        Self {
            owner_id,
            action,
            module: "quotes",
            details,
            request_metadata: None,
        }
    }
}

/// Sink for audit events. Implementations must be cheap to call; delivery
/// failures are the implementation's problem, not the caller's.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(&self, event: AuditEvent) -> anyhow::Result<()>;
}

/// Postgres-backed sink writing to `quote_audit_log`.
#[derive(Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn log(&self, event: AuditEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quote_audit_log (event_id, owner_id, action, module, details, request_metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.owner_id)
        .bind(event.action.as_str())
        .bind(event.module)
        .bind(&event.details)
        .bind(&event.request_metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Sink that drops everything; used in tests.
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn log(&self, _event: AuditEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
