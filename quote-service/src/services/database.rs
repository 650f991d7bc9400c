//! Database service for quote-service.
//!
//! Every quote read carries the same tenant + soft-delete predicate
//! (`owner_id = $n AND deleted_utc IS NULL`); items are filtered
//! transitively through a join on the parent quote. Write helpers that must
//! participate in a composer transaction take `&mut PgConnection` so the
//! caller owns the transaction boundary.

use crate::models::{
    ClientSummary, CreateQuote, ListQuotesFilter, Quote, QuoteItem, QuoteItemInput, QuoteStatus,
    UpdateQuote,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::pricing::{line_total, QuoteTotals};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use service_core::error::AppError;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "quote-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Collaborator lookups (clients, catalog)
    // -------------------------------------------------------------------------

    /// Resolve a client under its owner. Cross-tenant ids come back as None.
    #[instrument(skip(self), fields(owner_id = %owner_id, client_id = %client_id))]
    pub async fn get_client(
        &self,
        owner_id: Uuid,
        client_id: Uuid,
    ) -> Result<Option<ClientSummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_client"])
            .start_timer();

        let client = sqlx::query_as::<_, ClientSummary>(
            r#"
            SELECT client_id, owner_id, name, email, phone, company
            FROM clients
            WHERE owner_id = $1 AND client_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get client: {}", e)))?;

        timer.observe_duration();

        Ok(client)
    }

    /// Resolve catalog display names for a set of items, one per item.
    /// Unresolved references yield None, never an error.
    #[instrument(skip(self, items), fields(owner_id = %owner_id))]
    pub async fn resolve_display_names(
        &self,
        owner_id: Uuid,
        items: &[QuoteItem],
    ) -> Result<Vec<Option<String>>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["resolve_display_names"])
            .start_timer();

        let product_ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
        let service_ids: Vec<Uuid> = items.iter().filter_map(|i| i.service_id).collect();

        let mut product_names: HashMap<Uuid, String> = HashMap::new();
        if !product_ids.is_empty() {
            let rows: Vec<(Uuid, String)> = sqlx::query_as(
                r#"
                SELECT product_id, name FROM products
                WHERE owner_id = $1 AND product_id = ANY($2)
                "#,
            )
            .bind(owner_id)
            .bind(&product_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to resolve products: {}", e))
            })?;
            product_names.extend(rows);
        }

        let mut service_names: HashMap<Uuid, String> = HashMap::new();
        if !service_ids.is_empty() {
            let rows: Vec<(Uuid, String)> = sqlx::query_as(
                r#"
                SELECT service_id, name FROM services
                WHERE owner_id = $1 AND service_id = ANY($2)
                "#,
            )
            .bind(owner_id)
            .bind(&service_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to resolve services: {}", e))
            })?;
            service_names.extend(rows);
        }

        timer.observe_duration();

        Ok(items
            .iter()
            .map(|item| {
                item.product_id
                    .and_then(|id| product_names.get(&id).cloned())
                    .or_else(|| item.service_id.and_then(|id| service_names.get(&id).cloned()))
            })
            .collect())
    }

    // -------------------------------------------------------------------------
    // Quote reads (owner-scoped)
    // -------------------------------------------------------------------------

    /// Get a quote by id under its owner, excluding soft-deleted rows.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn get_quote(
        &self,
        owner_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quote"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            SELECT quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            FROM quotes
            WHERE owner_id = $1 AND quote_id = $2 AND deleted_utc IS NULL
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quote: {}", e)))?;

        timer.observe_duration();

        Ok(quote)
    }

    /// Get the items of a quote, filtered through the parent quote's
    /// soft-delete marker.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn get_quote_items(
        &self,
        owner_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Vec<QuoteItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quote_items"])
            .start_timer();

        let items = sqlx::query_as::<_, QuoteItem>(
            r#"
            SELECT i.item_id, i.quote_id, i.owner_id, i.product_id, i.service_id, i.description,
                i.quantity, i.unit_price, i.total, i.sort_order, i.created_utc
            FROM quote_items i
            JOIN quotes q ON q.quote_id = i.quote_id AND q.deleted_utc IS NULL
            WHERE i.owner_id = $1 AND i.quote_id = $2
            ORDER BY i.sort_order, i.created_utc
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quote items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    /// List quotes for an owner with filters, allow-listed sorting and
    /// page/offset pagination. Returns the page and the unpaged count.
    #[instrument(skip(self, filter), fields(owner_id = %owner_id))]
    pub async fn list_quotes(
        &self,
        owner_id: Uuid,
        filter: &ListQuotesFilter,
    ) -> Result<(Vec<Quote>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_quotes"])
            .start_timer();

        let status_str = filter.status.map(|s| s.as_str().to_string());
        let search = filter.search.as_deref().map(escape_like);
        let limit = filter.page_size;
        let offset = (filter.page - 1) * filter.page_size;

        // Sort column/direction come from closed enums, never from the caller.
        let page_query = format!(
            r#"
            SELECT quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            FROM quotes
            WHERE owner_id = $1 AND deleted_utc IS NULL
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::date IS NULL OR valid_until >= $4)
              AND ($5::date IS NULL OR valid_until <= $5)
              AND ($6::varchar IS NULL OR title ILIKE '%' || $6 || '%' OR description ILIKE '%' || $6 || '%')
            ORDER BY {} {}, quote_id
            LIMIT $7 OFFSET $8
            "#,
            filter.sort_by.as_column(),
            filter.sort_dir.as_sql(),
        );

        let quotes = sqlx::query_as::<_, Quote>(&page_query)
            .bind(owner_id)
            .bind(filter.client_id)
            .bind(&status_str)
            .bind(filter.valid_from)
            .bind(filter.valid_to)
            .bind(&search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list quotes: {}", e)))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM quotes
            WHERE owner_id = $1 AND deleted_utc IS NULL
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::date IS NULL OR valid_until >= $4)
              AND ($5::date IS NULL OR valid_until <= $5)
              AND ($6::varchar IS NULL OR title ILIKE '%' || $6 || '%' OR description ILIKE '%' || $6 || '%')
            "#,
        )
        .bind(owner_id)
        .bind(filter.client_id)
        .bind(&status_str)
        .bind(filter.valid_from)
        .bind(filter.valid_to)
        .bind(&search)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count quotes: {}", e)))?;

        timer.observe_duration();

        Ok((quotes, total))
    }

    // -------------------------------------------------------------------------
    // Public-identifier access (unauthenticated)
    // -------------------------------------------------------------------------

    /// Look a quote up by its public identifier. Soft-deleted rows are
    /// filtered here, so a deleted quote and an unknown token are
    /// indistinguishable to the caller.
    #[instrument(skip(self, public_id))]
    pub async fn get_quote_by_public_id(&self, public_id: &str) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quote_by_public_id"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            SELECT quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            FROM quotes
            WHERE public_id = $1 AND deleted_utc IS NULL
            "#,
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get quote by public id: {}", e))
        })?;

        timer.observe_duration();

        Ok(quote)
    }

    /// Record the counterparty's accept/reject response. Only applies while
    /// the quote is `sent`; returns None otherwise.
    #[instrument(skip(self, message), fields(quote_id = %quote_id))]
    pub async fn record_public_response(
        &self,
        quote_id: Uuid,
        status: QuoteStatus,
        message: Option<&str>,
    ) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_public_response"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET status = $2,
                response_message = $3,
                responded_utc = NOW(),
                updated_utc = NOW()
            WHERE quote_id = $1 AND status = 'sent' AND deleted_utc IS NULL
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(quote_id)
        .bind(status.as_str())
        .bind(message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to record public response: {}", e))
        })?;

        timer.observe_duration();

        Ok(quote)
    }

    // -------------------------------------------------------------------------
    // Quote writes
    // -------------------------------------------------------------------------

    /// Insert a new draft quote with placeholder totals. Runs on the
    /// caller's transaction.
    pub async fn insert_quote(
        conn: &mut PgConnection,
        owner_id: Uuid,
        public_id: &str,
        input: &CreateQuote,
    ) -> Result<Quote, AppError> {
        let quote_id = Uuid::new_v4();
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            INSERT INTO quotes (
                quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, 0, $8, $9, 0, $10)
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(quote_id)
        .bind(public_id)
        .bind(owner_id)
        .bind(input.client_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.valid_until)
        .bind(input.discount_amount)
        .bind(input.discount_percentage)
        .bind(&input.notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert quote: {}", e)))?;

        info!(quote_id = %quote.quote_id, "Draft quote inserted");

        Ok(quote)
    }

    /// Insert a replacement item set for a quote, preserving request order.
    /// Runs on the caller's transaction.
    pub async fn insert_items(
        conn: &mut PgConnection,
        owner_id: Uuid,
        quote_id: Uuid,
        items: &[QuoteItemInput],
    ) -> Result<Vec<QuoteItem>, AppError> {
        let mut inserted = Vec::with_capacity(items.len());
        for (sort_order, item) in items.iter().enumerate() {
            let row = sqlx::query_as::<_, QuoteItem>(
                r#"
                INSERT INTO quote_items (
                    item_id, quote_id, owner_id, product_id, service_id, description,
                    quantity, unit_price, total, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING item_id, quote_id, owner_id, product_id, service_id, description,
                    quantity, unit_price, total, sort_order, created_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(quote_id)
            .bind(owner_id)
            .bind(item.product_id)
            .bind(item.service_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(line_total(item.quantity, item.unit_price))
            .bind(sort_order as i32)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert quote item: {}", e))
            })?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    /// Delete every item of a quote (wholesale replacement). Runs on the
    /// caller's transaction.
    pub async fn delete_items(
        conn: &mut PgConnection,
        owner_id: Uuid,
        quote_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM quote_items
            WHERE owner_id = $1 AND quote_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete quote items: {}", e))
        })?;
        Ok(result.rows_affected())
    }

    /// Apply provided scalar fields to a quote. Runs on the caller's
    /// transaction.
    pub async fn update_quote_scalars(
        conn: &mut PgConnection,
        owner_id: Uuid,
        quote_id: Uuid,
        input: &UpdateQuote,
    ) -> Result<Option<Quote>, AppError> {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                valid_until = COALESCE($5, valid_until),
                discount_amount = COALESCE($6, discount_amount),
                discount_percentage = COALESCE($7, discount_percentage),
                notes = COALESCE($8, notes),
                updated_utc = NOW()
            WHERE owner_id = $1 AND quote_id = $2 AND deleted_utc IS NULL
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.valid_until)
        .bind(input.discount_amount)
        .bind(input.discount_percentage)
        .bind(&input.notes)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update quote: {}", e)))?;

        Ok(quote)
    }

    /// Persist recomputed totals. Runs on the caller's transaction.
    pub async fn update_totals(
        conn: &mut PgConnection,
        owner_id: Uuid,
        quote_id: Uuid,
        totals: QuoteTotals,
    ) -> Result<Option<Quote>, AppError> {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET subtotal = $3,
                total = $4,
                updated_utc = NOW()
            WHERE owner_id = $1 AND quote_id = $2 AND deleted_utc IS NULL
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .bind(totals.subtotal)
        .bind(totals.total)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quote totals: {}", e))
        })?;

        Ok(quote)
    }

    /// Insert a copy of a source quote: fresh ids, status reset to draft,
    /// validity cleared, response fields cleared. Runs on the caller's
    /// transaction.
    pub async fn insert_quote_copy(
        conn: &mut PgConnection,
        source: &Quote,
        public_id: &str,
        title: &str,
    ) -> Result<Quote, AppError> {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            INSERT INTO quotes (
                quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'draft', NULL, $7, $8, $9, $10, $11)
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(public_id)
        .bind(source.owner_id)
        .bind(source.client_id)
        .bind(title)
        .bind(&source.description)
        .bind(source.subtotal)
        .bind(source.discount_amount)
        .bind(source.discount_percentage)
        .bind(source.total)
        .bind(&source.notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to copy quote: {}", e)))?;

        Ok(quote)
    }

    /// Update a quote's status. Bumps `updated_utc`.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn update_status(
        &self,
        owner_id: Uuid,
        quote_id: Uuid,
        status: QuoteStatus,
    ) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_status"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET status = $3,
                updated_utc = NOW()
            WHERE owner_id = $1 AND quote_id = $2 AND deleted_utc IS NULL
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quote status: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref q) = quote {
            info!(quote_id = %q.quote_id, status = %q.status, "Quote status updated");
        }

        Ok(quote)
    }

    /// Soft-delete a quote. Items are not touched; they disappear from reads
    /// through the parent filter.
    #[instrument(skip(self), fields(owner_id = %owner_id, quote_id = %quote_id))]
    pub async fn soft_delete_quote(
        &self,
        owner_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["soft_delete_quote"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET deleted_utc = NOW(),
                updated_utc = NOW()
            WHERE owner_id = $1 AND quote_id = $2 AND deleted_utc IS NULL
            RETURNING quote_id, public_id, owner_id, client_id, title, description, status,
                valid_until, subtotal, discount_amount, discount_percentage, total, notes,
                response_message, responded_utc, created_utc, updated_utc, deleted_utc
            "#,
        )
        .bind(owner_id)
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete quote: {}", e)))?;

        timer.observe_duration();

        if quote.is_some() {
            info!(quote_id = %quote_id, "Quote soft-deleted");
        }

        Ok(quote)
    }
}

/// Escape LIKE wildcards so a search term matches as a literal substring.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain term"), "plain term");
    }
}
