//! Quote composer: orchestrates create/update/duplicate/delete and status
//! changes as single transactions, invoking the pricing engine and the
//! transition policy, then notifying the audit sink.
//!
//! Every operation takes an explicit `owner_id`; there is no ambient request
//! user. Cross-tenant ids fail as NotFound so callers cannot probe for
//! existence.

use anyhow::anyhow;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use service_core::error::AppError;

use crate::dtos::{ClientView, ListQuotesResponse, QuoteDetail, QuoteItemView};
use crate::models::{
    CreateQuote, ListQuotesFilter, Quote, QuoteItem, QuoteItemInput, QuoteStatus, UpdateQuote,
};
use crate::services::audit::{AuditAction, AuditEvent, AuditSink};
use crate::services::database::Database;
use crate::services::lifecycle::TransitionPolicy;
use crate::services::metrics::QUOTE_OPERATIONS_TOTAL;
use crate::services::pricing::{self, PricedLine, QuoteTotals};

/// Length of the opaque public identifier.
const PUBLIC_ID_LEN: usize = 22;

/// Generate a fresh opaque public identifier.
pub fn generate_public_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PUBLIC_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Clone)]
pub struct QuoteComposer {
    db: Database,
    audit: Arc<dyn AuditSink>,
    transitions: TransitionPolicy,
}

impl QuoteComposer {
    pub fn new(db: Database, audit: Arc<dyn AuditSink>, transitions: TransitionPolicy) -> Self {
        Self {
            db,
            audit,
            transitions,
        }
    }

    /// Create a quote, optionally with items, as one atomic transaction.
    #[instrument(skip(self, input), fields(owner_id = %owner_id, client_id = %input.client_id))]
    pub async fn create(&self, owner_id: Uuid, input: CreateQuote) -> Result<QuoteDetail, AppError> {
        self.db
            .get_client(owner_id, input.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Client not found")))?;

        let public_id = generate_public_id();

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow!("Failed to begin transaction: {}", e)))?;

        let mut quote = Database::insert_quote(&mut *tx, owner_id, &public_id, &input).await?;

        if !input.items.is_empty() {
            Database::insert_items(&mut *tx, owner_id, quote.quote_id, &input.items).await?;
            let totals = pricing::recalculate(
                &priced_lines_from_inputs(&input.items),
                input.discount_percentage,
                input.discount_amount,
            );
            quote = Database::update_totals(&mut *tx, owner_id, quote.quote_id, totals)
                .await?
                .ok_or_else(|| AppError::InternalError(anyhow!("Quote lost inside transaction")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow!("Failed to commit transaction: {}", e)))?;

        let detail = self.hydrate(quote).await?;
        self.emit(
            owner_id,
            AuditAction::Create,
            json!({
                "quote_id": detail.quote.quote_id,
                "title": detail.quote.title,
                "total": detail.quote.total,
                "item_count": detail.items.len(),
            }),
        );
        Ok(detail)
    }

    /// Fetch one hydrated quote under its owner.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn get(&self, owner_id: Uuid, quote_id: Uuid) -> Result<QuoteDetail, AppError> {
        let quote = self
            .db
            .get_quote(owner_id, quote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;
        self.hydrate(quote).await
    }

    /// List quotes under an owner.
    #[instrument(skip(self, filter), fields(owner_id = %owner_id))]
    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: ListQuotesFilter,
    ) -> Result<ListQuotesResponse, AppError> {
        let (quotes, total) = self.db.list_quotes(owner_id, &filter).await?;
        let total_pages = if total == 0 {
            0
        } else {
            (total + filter.page_size - 1) / filter.page_size
        };
        Ok(ListQuotesResponse {
            quotes,
            total,
            page: filter.page,
            page_size: filter.page_size,
            total_pages,
        })
    }

    /// Partial update. A present `items` list (even empty) replaces the item
    /// set wholesale and always triggers recalculation; otherwise totals are
    /// recomputed only when a discount directive changed.
    #[instrument(skip(self, input), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn update(
        &self,
        owner_id: Uuid,
        quote_id: Uuid,
        input: UpdateQuote,
    ) -> Result<QuoteDetail, AppError> {
        let before = self
            .db
            .get_quote(owner_id, quote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow!("Failed to begin transaction: {}", e)))?;

        let mut quote = Database::update_quote_scalars(&mut *tx, owner_id, quote_id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;

        if let Some(items) = &input.items {
            Database::delete_items(&mut *tx, owner_id, quote_id).await?;
            Database::insert_items(&mut *tx, owner_id, quote_id, items).await?;
            let totals = pricing::recalculate(
                &priced_lines_from_inputs(items),
                quote.discount_percentage,
                quote.discount_amount,
            );
            quote = Database::update_totals(&mut *tx, owner_id, quote_id, totals)
                .await?
                .ok_or_else(|| AppError::InternalError(anyhow!("Quote lost inside transaction")))?;
        } else if input.touches_discount() {
            // Items untouched: re-derive the total against the stored subtotal.
            let total = pricing::apply_discount(
                quote.subtotal,
                quote.discount_percentage,
                quote.discount_amount,
            );
            quote = Database::update_totals(
                &mut *tx,
                owner_id,
                quote_id,
                QuoteTotals {
                    subtotal: quote.subtotal,
                    total,
                },
            )
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow!("Quote lost inside transaction")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow!("Failed to commit transaction: {}", e)))?;

        let detail = self.hydrate(quote).await?;
        self.emit(
            owner_id,
            AuditAction::Update,
            json!({
                "quote_id": quote_id,
                "before": { "title": before.title, "status": before.status, "total": before.total },
                "after": { "title": detail.quote.title, "status": detail.quote.status, "total": detail.quote.total },
            }),
        );
        Ok(detail)
    }

    /// Clone a quote: fresh ids and public identifier, status reset to
    /// draft, validity cleared, items copied.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn duplicate(&self, owner_id: Uuid, quote_id: Uuid) -> Result<QuoteDetail, AppError> {
        let source = self
            .db
            .get_quote(owner_id, quote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;
        let source_items = self.db.get_quote_items(owner_id, quote_id).await?;

        let public_id = generate_public_id();
        let title = format!("{} (copy)", source.title);

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow!("Failed to begin transaction: {}", e)))?;

        let copy = Database::insert_quote_copy(&mut *tx, &source, &public_id, &title).await?;
        let item_inputs: Vec<QuoteItemInput> = source_items.iter().map(item_to_input).collect();
        Database::insert_items(&mut *tx, owner_id, copy.quote_id, &item_inputs).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow!("Failed to commit transaction: {}", e)))?;

        let detail = self.hydrate(copy).await?;
        self.emit(
            owner_id,
            AuditAction::Duplicate,
            json!({
                "quote_id": detail.quote.quote_id,
                "source_quote_id": quote_id,
            }),
        );
        Ok(detail)
    }

    /// Soft-delete a quote. Items are excluded transitively through the
    /// parent's marker; no item rows are touched.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn delete(&self, owner_id: Uuid, quote_id: Uuid) -> Result<(), AppError> {
        let deleted = self
            .db
            .soft_delete_quote(owner_id, quote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;

        self.emit(
            owner_id,
            AuditAction::Delete,
            json!({
                "quote_id": quote_id,
                "snapshot": { "title": deleted.title, "status": deleted.status, "total": deleted.total },
            }),
        );
        Ok(())
    }

    /// Explicit status transition.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id, target = %target))]
    pub async fn change_status(
        &self,
        owner_id: Uuid,
        quote_id: Uuid,
        target: &str,
    ) -> Result<QuoteDetail, AppError> {
        let target = self.transitions.parse_target(target)?;

        let quote = self
            .db
            .get_quote(owner_id, quote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;
        let from = QuoteStatus::from_string(&quote.status);
        self.transitions.validate(from, target)?;

        let updated = self
            .db
            .update_status(owner_id, quote_id, target)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;

        let detail = self.hydrate(updated).await?;
        self.emit(
            owner_id,
            AuditAction::StatusUpdate,
            json!({
                "quote_id": quote_id,
                "old_status": from.as_str(),
                "new_status": target.as_str(),
            }),
        );
        Ok(detail)
    }

    /// Attach items (with catalog display names) and client display fields.
    async fn hydrate(&self, quote: Quote) -> Result<QuoteDetail, AppError> {
        let items = self.db.get_quote_items(quote.owner_id, quote.quote_id).await?;
        let names = self.db.resolve_display_names(quote.owner_id, &items).await?;
        let client = self
            .db
            .get_client(quote.owner_id, quote.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Client not found")))?;

        let items = items
            .into_iter()
            .zip(names)
            .map(|(item, display_name)| QuoteItemView { item, display_name })
            .collect();

        Ok(QuoteDetail {
            quote,
            items,
            client: ClientView::from(client),
        })
    }

    /// Fire-and-forget audit emission. Sink failures are logged and
    /// discarded; they never reach the primary operation.
    fn emit(&self, owner_id: Uuid, action: AuditAction, details: serde_json::Value) {
        QUOTE_OPERATIONS_TOTAL
            .with_label_values(&[action.as_str()])
            .inc();
        let sink = Arc::clone(&self.audit);
        let event = AuditEvent::new(owner_id, action, details);
        tokio::spawn(async move {
            if let Err(e) = sink.log(event).await {
                tracing::warn!(error = %e, "Audit emission failed");
            }
        });
    }
}

fn priced_lines_from_inputs(items: &[QuoteItemInput]) -> Vec<PricedLine> {
    items
        .iter()
        .map(|item| PricedLine {
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect()
}

fn item_to_input(item: &QuoteItem) -> QuoteItemInput {
    QuoteItemInput {
        product_id: item.product_id,
        service_id: item.service_id,
        description: item.description.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
    }
}
