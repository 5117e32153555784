//! # Invoice Repository
//!
//! Database operations for invoices. An invoice exists only after its
//! payment does, at most one per payment (UNIQUE constraint), and is
//! immutable once created except for timestamps.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tribune_core::Invoice;

const INVOICE_COLUMNS: &str =
    "id, payment_id, order_id, user_id, number, legal_notice, created_at, updated_at";

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Gets the invoice generated for a payment, if any.
    pub async fn get_by_payment(&self, payment_id: &str) -> DbResult<Option<Invoice>> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE payment_id = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Lists a user's invoices, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Invoice>> {
        let query = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Lists every invoice (admin), newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Invoice>> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC");
        let invoices = sqlx::query_as::<_, Invoice>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Inserts a new invoice.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - an invoice already exists for
    ///   this payment, or the business number collided
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(payment_id = %invoice.payment_id, number = %invoice.number, "Inserting invoice");

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, payment_id, order_id, user_id,
                number, legal_notice, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.payment_id)
        .bind(&invoice.order_id)
        .bind(&invoice.user_id)
        .bind(&invoice.number)
        .bind(&invoice.legal_notice)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Generates a new invoice ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates an invoice business number: `FACT-` + 8 uppercase hex chars.
pub fn generate_invoice_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("FACT-{}", id[..8].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_invoice_number_format() {
        let number = generate_invoice_number();
        assert!(number.starts_with("FACT-"));
        assert_eq!(number.len(), 13);
    }
}
