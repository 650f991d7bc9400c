//! Client display fields used for quote hydration.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Display/contact fields of a client, resolved under the owning tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientSummary {
    pub client_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}
