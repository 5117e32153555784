//! # Payment Repository
//!
//! Database operations for payments and the payment-history ledger.
//!
//! ## Payment + Accrual
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             create_with_accrual (ONE transaction)                       │
//! │                                                                         │
//! │  1. INSERT the payment                                                 │
//! │     └── UNIQUE(order_id) violation → a payment already exists          │
//! │  2. UPDATE the user's loyalty point balance (+accrued points)          │
//! │                                                                         │
//! │  Points accrue exactly once per successful payment, here. Mirroring    │
//! │  the payment into the history ledger never accrues again.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tribune_core::{Payment, PaymentHistoryEntry};

const PAYMENT_COLUMNS: &str =
    "id, order_id, user_id, method, status, amount, currency, transaction_id, details, paid_at";

const HISTORY_COLUMNS: &str = "id, order_id, user_id, method, status, amount, currency, \
     transaction_id, paid_at, created_at";

/// Repository for payment and payment-history database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Gets the payment recorded against an order, if any.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<Payment>> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Lists a user's payments, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Payment>> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = ?1 ORDER BY paid_at DESC"
        );
        let payments = sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Lists every payment (admin), newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Payment>> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY paid_at DESC");
        let payments = sqlx::query_as::<_, Payment>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Records a payment and credits the accrued loyalty points, atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - a payment already exists for
    ///   this order; the existing payment is left unmodified
    pub async fn create_with_accrual(&self, payment: &Payment, points: i64) -> DbResult<()> {
        debug!(
            order_id = %payment.order_id,
            amount = %payment.amount,
            points,
            "Recording payment"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, user_id, method, status,
                amount, currency, transaction_id, details, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(&payment.user_id)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(&payment.transaction_id)
        .bind(&payment.details)
        .bind(payment.paid_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET loyalty_points = loyalty_points + ?2 WHERE id = ?1")
            .bind(&payment.user_id)
            .bind(points)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Payment History Ledger
    // =========================================================================

    /// Gets a history entry by ID.
    pub async fn get_history(&self, id: &str) -> DbResult<Option<PaymentHistoryEntry>> {
        let query = format!("SELECT {HISTORY_COLUMNS} FROM payment_history WHERE id = ?1");
        let entry = sqlx::query_as::<_, PaymentHistoryEntry>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Lists a user's history entries, newest first.
    pub async fn list_history_for_user(&self, user_id: &str) -> DbResult<Vec<PaymentHistoryEntry>> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM payment_history WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let entries = sqlx::query_as::<_, PaymentHistoryEntry>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Lists every history entry (admin), newest first.
    pub async fn list_history_all(&self) -> DbResult<Vec<PaymentHistoryEntry>> {
        let query =
            format!("SELECT {HISTORY_COLUMNS} FROM payment_history ORDER BY created_at DESC");
        let entries = sqlx::query_as::<_, PaymentHistoryEntry>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Appends a history entry mirroring a payment. No accrual here.
    pub async fn insert_history(&self, entry: &PaymentHistoryEntry) -> DbResult<()> {
        debug!(order_id = %entry.order_id, "Appending payment history entry");

        sqlx::query(
            r#"
            INSERT INTO payment_history (
                id, order_id, user_id, method, status,
                amount, currency, transaction_id, paid_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.order_id)
        .bind(&entry.user_id)
        .bind(entry.method)
        .bind(entry.status)
        .bind(entry.amount)
        .bind(entry.currency)
        .bind(&entry.transaction_id)
        .bind(entry.paid_at)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a history entry and applies a compensating point reversal,
    /// atomically.
    ///
    /// `points` is the reversal computed by the caller (zero when the
    /// mirrored payment was not `paid`). The balance floors at zero.
    pub async fn delete_history_with_reversal(
        &self,
        entry_id: &str,
        user_id: &str,
        points: i64,
    ) -> DbResult<()> {
        debug!(entry_id = %entry_id, user_id = %user_id, points, "Deleting history entry");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM payment_history WHERE id = ?1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment history entry", entry_id));
        }

        if points > 0 {
            sqlx::query(
                "UPDATE users SET loyalty_points = MAX(0, loyalty_points - ?2) WHERE id = ?1",
            )
            .bind(user_id)
            .bind(points)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }
}

/// Generates a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new history entry ID.
pub fn generate_history_id() -> String {
    Uuid::new_v4().to_string()
}
