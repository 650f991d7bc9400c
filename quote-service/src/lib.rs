//! quote-service: sales-quote lifecycle and pricing for fabrication shops.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
