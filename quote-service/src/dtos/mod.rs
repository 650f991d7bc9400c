//! Request and response types for the HTTP surface.

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    ClientSummary, CreateQuote, ListQuotesFilter, Quote, QuoteItem, QuoteItemInput,
    QuoteSortField, QuoteStatus, SortDirection, UpdateQuote,
};

const MAX_PAGE_SIZE: i64 = 100;

fn validate_discounts(
    amount: &Option<Decimal>,
    percentage: &Option<Decimal>,
) -> Result<(), AppError> {
    if let Some(amount) = amount {
        if *amount < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!(
                "Discount amount cannot be negative"
            )));
        }
    }
    if let Some(percentage) = percentage {
        if *percentage < Decimal::ZERO || *percentage > Decimal::ONE_HUNDRED {
            return Err(AppError::BadRequest(anyhow!(
                "Discount percentage must be between 0 and 100"
            )));
        }
    }
    Ok(())
}

/// One line item in a create/update request.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteItemRequest {
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl QuoteItemRequest {
    fn into_input(self) -> Result<QuoteItemInput, AppError> {
        let input = QuoteItemInput {
            product_id: self.product_id,
            service_id: self.service_id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
        };
        input.validate()?;
        Ok(input)
    }
}

/// Body of `POST /quotes`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub items: Option<Vec<QuoteItemRequest>>,
}

impl CreateQuoteRequest {
    pub fn into_create(self) -> Result<CreateQuote, AppError> {
        self.validate()?;
        validate_discounts(&self.discount_amount, &self.discount_percentage)?;
        let items = self
            .items
            .unwrap_or_default()
            .into_iter()
            .map(QuoteItemRequest::into_input)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CreateQuote {
            client_id: self.client_id,
            title: self.title,
            description: self.description,
            valid_until: self.valid_until,
            discount_amount: self.discount_amount,
            discount_percentage: self.discount_percentage,
            notes: self.notes,
            items,
        })
    }
}

/// Body of `PUT /quotes/:id`. Absent fields are left untouched; a present
/// `items` list (even empty) replaces the whole item set.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuoteRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub items: Option<Vec<QuoteItemRequest>>,
}

impl UpdateQuoteRequest {
    pub fn into_update(self) -> Result<UpdateQuote, AppError> {
        self.validate()?;
        validate_discounts(&self.discount_amount, &self.discount_percentage)?;
        let items = match self.items {
            Some(items) => Some(
                items
                    .into_iter()
                    .map(QuoteItemRequest::into_input)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(UpdateQuote {
            title: self.title,
            description: self.description,
            valid_until: self.valid_until,
            discount_amount: self.discount_amount,
            discount_percentage: self.discount_percentage,
            notes: self.notes,
            items,
        })
    }
}

/// Body of `PUT /quotes/:id/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Body of `PUT /quotes/public/:public_id/response`. Deliberately closed:
/// the counterparty can record intent and a message, nothing else.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PublicResponseRequest {
    pub accepted: bool,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Query parameters of `GET /quotes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuotesParams {
    pub client_id: Option<Uuid>,
    pub status: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListQuotesParams {
    pub fn into_filter(self) -> Result<ListQuotesFilter, AppError> {
        let status = match self.status.as_deref() {
            Some(s) => Some(
                QuoteStatus::try_parse(s)
                    .ok_or_else(|| AppError::BadRequest(anyhow!("Unknown status '{}'", s)))?,
            ),
            None => None,
        };
        let sort_by = match self.sort_by.as_deref() {
            Some(s) => QuoteSortField::try_parse(s)
                .ok_or_else(|| AppError::BadRequest(anyhow!("Unsupported sort field '{}'", s)))?,
            None => QuoteSortField::default(),
        };
        let sort_dir = match self.sort_dir.as_deref() {
            Some(s) => SortDirection::try_parse(s)
                .ok_or_else(|| AppError::BadRequest(anyhow!("Unsupported sort direction '{}'", s)))?,
            None => SortDirection::default(),
        };
        Ok(ListQuotesFilter {
            client_id: self.client_id,
            status,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            search: self.search.filter(|s| !s.trim().is_empty()),
            sort_by,
            sort_dir,
            page: self.page.unwrap_or(1).max(1),
            page_size: self.page_size.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        })
    }
}

/// Line item with its catalog display name resolved.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteItemView {
    #[serde(flatten)]
    pub item: QuoteItem,
    /// Null when the catalog reference no longer resolves.
    pub display_name: Option<String>,
}

/// Client fields exposed to the owning tenant.
#[derive(Debug, Clone, Serialize)]
pub struct ClientView {
    pub client_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl From<ClientSummary> for ClientView {
    fn from(c: ClientSummary) -> Self {
        Self {
            client_id: c.client_id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            company: c.company,
        }
    }
}

/// Fully hydrated quote returned by the authenticated routes.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub quote: Quote,
    pub items: Vec<QuoteItemView>,
    pub client: ClientView,
}

/// Paginated list response.
#[derive(Debug, Clone, Serialize)]
pub struct ListQuotesResponse {
    pub quotes: Vec<Quote>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Public line item: no internal ids beyond what rendering needs.
#[derive(Debug, Clone, Serialize)]
pub struct PublicItemView {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Client contact fields exposed on the public view.
#[derive(Debug, Clone, Serialize)]
pub struct PublicClientView {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// Quote as seen through the sharing gateway. No owner id, no internal ids.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuoteView {
    pub public_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub valid_until: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub total: Decimal,
    pub notes: Option<String>,
    pub response_message: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub client: PublicClientView,
    pub items: Vec<PublicItemView>,
}
