//! Authenticated quote handlers.
//!
//! All operations are scoped to the owner from the request context; an id
//! belonging to another owner answers as NotFound.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        CreateQuoteRequest, ListQuotesParams, ListQuotesResponse, QuoteDetail, UpdateQuoteRequest,
        UpdateStatusRequest,
    },
    middleware::TenantContext,
    AppState,
};

/// Create a new quote within the owner's scope.
pub async fn create_quote(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<QuoteDetail>), AppError> {
    tracing::info!(
        owner_id = %tenant.owner_id,
        client_id = %payload.client_id,
        "Creating quote"
    );

    let input = payload.into_create()?;
    let detail = state.composer.create(tenant.owner_id, input).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// List quotes within the owner's scope, with filters and pagination.
pub async fn list_quotes(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<ListQuotesParams>,
) -> Result<Json<ListQuotesResponse>, AppError> {
    tracing::info!(owner_id = %tenant.owner_id, "Listing quotes");

    let filter = params.into_filter()?;
    let response = state.composer.list(tenant.owner_id, filter).await?;

    Ok(Json(response))
}

/// Get a quote by id within the owner's scope.
pub async fn get_quote(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<QuoteDetail>, AppError> {
    tracing::info!(
        owner_id = %tenant.owner_id,
        quote_id = %quote_id,
        "Fetching quote"
    );

    let detail = state.composer.get(tenant.owner_id, quote_id).await?;

    Ok(Json(detail))
}

/// Partially update a quote within the owner's scope.
pub async fn update_quote(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<UpdateQuoteRequest>,
) -> Result<Json<QuoteDetail>, AppError> {
    tracing::info!(
        owner_id = %tenant.owner_id,
        quote_id = %quote_id,
        "Updating quote"
    );

    let input = payload.into_update()?;
    let detail = state.composer.update(tenant.owner_id, quote_id, input).await?;

    Ok(Json(detail))
}

/// Soft-delete a quote within the owner's scope.
pub async fn delete_quote(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tracing::info!(
        owner_id = %tenant.owner_id,
        quote_id = %quote_id,
        "Deleting quote"
    );

    state.composer.delete(tenant.owner_id, quote_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Explicitly change a quote's status within the owner's scope.
pub async fn update_quote_status(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<QuoteDetail>, AppError> {
    tracing::info!(
        owner_id = %tenant.owner_id,
        quote_id = %quote_id,
        new_status = %payload.status,
        "Updating quote status"
    );

    let detail = state
        .composer
        .change_status(tenant.owner_id, quote_id, &payload.status)
        .await?;

    Ok(Json(detail))
}

/// Duplicate a quote within the owner's scope.
pub async fn duplicate_quote(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<(StatusCode, Json<QuoteDetail>), AppError> {
    tracing::info!(
        owner_id = %tenant.owner_id,
        quote_id = %quote_id,
        "Duplicating quote"
    );

    let detail = state.composer.duplicate(tenant.owner_id, quote_id).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}
