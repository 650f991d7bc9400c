//! Quote model for quote-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::quote_item::QuoteItemInput;

/// Quote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }

    /// Lenient parse for database rows; unknown values fall back to draft.
    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => QuoteStatus::Sent,
            "accepted" => QuoteStatus::Accepted,
            "rejected" => QuoteStatus::Rejected,
            "expired" => QuoteStatus::Expired,
            _ => QuoteStatus::Draft,
        }
    }

    /// Strict parse for caller input. Unknown literals are rejected.
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(QuoteStatus::Draft),
            "sent" => Some(QuoteStatus::Sent),
            "accepted" => Some(QuoteStatus::Accepted),
            "rejected" => Some(QuoteStatus::Rejected),
            "expired" => Some(QuoteStatus::Expired),
            _ => None,
        }
    }

    pub fn all() -> [QuoteStatus; 5] {
        [
            QuoteStatus::Draft,
            QuoteStatus::Sent,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
            QuoteStatus::Expired,
        ]
    }
}

/// Quote row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub quote_id: Uuid,
    pub public_id: String,
    pub owner_id: Uuid,
    pub client_id: Uuid,
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
    pub responded_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

/// Sortable fields for the quote list. Anything outside this set is
/// rejected before it gets near a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteSortField {
    Title,
    Status,
    Total,
    ValidUntil,
    #[default]
    CreatedAt,
}

impl QuoteSortField {
    pub fn as_column(&self) -> &'static str {
        match self {
            QuoteSortField::Title => "title",
            QuoteSortField::Status => "status",
            QuoteSortField::Total => "total",
            QuoteSortField::ValidUntil => "valid_until",
            QuoteSortField::CreatedAt => "created_utc",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(QuoteSortField::Title),
            "status" => Some(QuoteSortField::Status),
            "total" => Some(QuoteSortField::Total),
            "valid_until" => Some(QuoteSortField::ValidUntil),
            "created_at" => Some(QuoteSortField::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Filter parameters for listing quotes.
#[derive(Debug, Clone, Default)]
pub struct ListQuotesFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<QuoteStatus>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: QuoteSortField,
    pub sort_dir: SortDirection,
    pub page: i64,
    pub page_size: i64,
}

/// Input for creating a quote.
#[derive(Debug, Clone)]
pub struct CreateQuote {
    pub client_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub items: Vec<QuoteItemInput>,
}

/// Input for a partial quote update. `items: Some(..)` (including an empty
/// list) replaces the whole item set; `None` leaves items untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuote {
    pub title: Option<String>,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub discount_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub items: Option<Vec<QuoteItemInput>>,
}

impl UpdateQuote {
    /// True when either discount directive is present in the request.
    pub fn touches_discount(&self) -> bool {
        self.discount_amount.is_some() || self.discount_percentage.is_some()
    }
}
