//! Sharing gateway: unauthenticated access to a single quote through its
//! opaque public identifier.
//!
//! The error surface never distinguishes "token unknown" from "quote
//! deleted"; both are the same NotFound. The public view carries no owner
//! id and no internal ids beyond what rendering requires.

use anyhow::anyhow;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use service_core::error::AppError;

use crate::dtos::{PublicClientView, PublicItemView, PublicQuoteView};
use crate::models::{Quote, QuoteStatus};
use crate::services::audit::{AuditAction, AuditEvent, AuditSink};
use crate::services::database::Database;
use crate::services::metrics::PUBLIC_LOOKUPS_TOTAL;

#[derive(Clone)]
pub struct SharingGateway {
    db: Database,
    audit: Arc<dyn AuditSink>,
}

impl SharingGateway {
    pub fn new(db: Database, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Read a quote through its public identifier.
    #[instrument(skip(self, public_id))]
    pub async fn get_by_public_id(&self, public_id: &str) -> Result<PublicQuoteView, AppError> {
        let quote = match self.db.get_quote_by_public_id(public_id).await? {
            Some(quote) => {
                PUBLIC_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
                quote
            }
            None => {
                PUBLIC_LOOKUPS_TOTAL.with_label_values(&["miss"]).inc();
                return Err(AppError::NotFound(anyhow!("Quote not found")));
            }
        };
        self.public_view(quote).await
    }

    /// Record the counterparty's accept/reject intent. Only valid while the
    /// quote is `sent`.
    #[instrument(skip(self, public_id, message))]
    pub async fn record_response(
        &self,
        public_id: &str,
        accepted: bool,
        message: Option<&str>,
    ) -> Result<PublicQuoteView, AppError> {
        let quote = self
            .db
            .get_quote_by_public_id(public_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;

        if QuoteStatus::from_string(&quote.status) != QuoteStatus::Sent {
            return Err(AppError::BadRequest(anyhow!(
                "Quote is not open for a response"
            )));
        }

        let target = if accepted {
            QuoteStatus::Accepted
        } else {
            QuoteStatus::Rejected
        };

        let updated = self
            .db
            .record_public_response(quote.quote_id, target, message)
            .await?
            // Raced with an owner-side status change; same closed-door answer.
            .ok_or_else(|| AppError::BadRequest(anyhow!("Quote is not open for a response")))?;

        let owner_id = updated.owner_id;
        let event = AuditEvent::new(
            owner_id,
            AuditAction::PublicResponse,
            json!({
                "quote_id": updated.quote_id,
                "new_status": updated.status,
            }),
        );
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = sink.log(event).await {
                tracing::warn!(error = %e, "Audit emission failed");
            }
        });

        self.public_view(updated).await
    }

    /// Trim a quote down to its public rendering.
    async fn public_view(&self, quote: Quote) -> Result<PublicQuoteView, AppError> {
        let items = self.db.get_quote_items(quote.owner_id, quote.quote_id).await?;
        let names = self.db.resolve_display_names(quote.owner_id, &items).await?;
        let client = self
            .db
            .get_client(quote.owner_id, quote.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Quote not found")))?;

        Ok(PublicQuoteView {
            public_id: quote.public_id,
            title: quote.title,
            description: quote.description,
            status: quote.status,
            valid_until: quote.valid_until,
            subtotal: quote.subtotal,
            discount_amount: quote.discount_amount,
            discount_percentage: quote.discount_percentage,
            total: quote.total,
            notes: quote.notes,
            response_message: quote.response_message,
            created_utc: quote.created_utc,
            client: PublicClientView {
                name: client.name,
                email: client.email,
                phone: client.phone,
                company: client.company,
            },
            items: items
                .into_iter()
                .zip(names)
                .map(|(item, display_name)| PublicItemView {
                    display_name,
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total: item.total,
                })
                .collect(),
        })
    }
}
