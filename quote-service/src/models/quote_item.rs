//! Quote line item model for quote-service.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use uuid::Uuid;

/// Line item on a quote. Exactly one of `product_id` / `service_id` is set
/// (enforced on input and by a table CHECK).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuoteItem {
    pub item_id: Uuid,
    pub quote_id: Uuid,
    pub owner_id: Uuid,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Input for a quote line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteItemInput {
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl QuoteItemInput {
    pub fn validate(&self) -> Result<(), AppError> {
        match (self.product_id, self.service_id) {
            (Some(_), Some(_)) => {
                return Err(AppError::BadRequest(anyhow!(
                    "Item must reference a product or a service, not both"
                )))
            }
            (None, None) => {
                return Err(AppError::BadRequest(anyhow!(
                    "Item must reference a product or a service"
                )))
            }
            _ => {}
        }
        if self.quantity < 1 {
            return Err(AppError::BadRequest(anyhow!(
                "Item quantity must be a positive integer"
            )));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!(
                "Item unit price cannot be negative"
            )));
        }
        Ok(())
    }
}
