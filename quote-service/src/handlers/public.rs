//! Unauthenticated public handlers, reached through the opaque public id.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{PublicQuoteView, PublicResponseRequest},
    AppState,
};

/// Get a quote by its public identifier. No authentication; the token is
/// the capability.
pub async fn get_public_quote(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<PublicQuoteView>, AppError> {
    tracing::info!("Fetching public quote");

    let view = state.sharing.get_by_public_id(&public_id).await?;

    Ok(Json(view))
}

/// Record the counterparty's accept/reject response to a sent quote.
pub async fn record_public_response(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(payload): Json<PublicResponseRequest>,
) -> Result<Json<PublicQuoteView>, AppError> {
    tracing::info!(accepted = payload.accepted, "Recording public response");

    payload.validate()?;
    let view = state
        .sharing
        .record_response(&public_id, payload.accepted, payload.message.as_deref())
        .await?;

    Ok(Json(view))
}
