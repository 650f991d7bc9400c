pub mod health;
pub mod public;
pub mod quotes;
