//! Tenant context extractor.
//!
//! The owning tenant arrives as the `X-Owner-ID` header, set by the gateway
//! after authenticating the user. This service never derives the owner from
//! anything else; every repository call takes it explicitly.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

/// Owning tenant of the current request.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub owner_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Owner-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Missing X-Owner-ID header (required from gateway)"
                ))
            })?;

        let owner_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!("X-Owner-ID header is not a valid UUID"))
        })?;

        let span = tracing::Span::current();
        span.record("owner_id", raw);

        Ok(TenantContext { owner_id })
    }
}
