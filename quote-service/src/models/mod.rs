//! Data models for quote-service.

pub mod client;
pub mod quote;
pub mod quote_item;

pub use client::ClientSummary;
pub use quote::{
    CreateQuote, ListQuotesFilter, Quote, QuoteSortField, QuoteStatus, SortDirection, UpdateQuote,
};
pub use quote_item::{QuoteItem, QuoteItemInput};
