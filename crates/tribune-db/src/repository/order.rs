//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              create_checked (ONE transaction)                           │
//! │                                                                         │
//! │  1. INSERT the order (captured total + captured discount %)            │
//! │  2. For each line item:                                                │
//! │     ├── conditional stock decrement (quantity >= requested)            │
//! │     │   └── zero rows → StockExhausted → whole checkout aborts         │
//! │     └── INSERT order_items row                                         │
//! │  3. DELETE the cart (items cascade)                                    │
//! │                                                                         │
//! │  Two checkouts racing for the last units: exactly one commits.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::{decrement_stock, restock};
use tribune_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = "id, user_id, total, discount_pct, street, city, postal_code, \
     country, status, expected_delivery, created_at, updated_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets all line items of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, size, quantity FROM order_items WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Lists every order (admin), newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let orders = sqlx::query_as::<_, Order>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Creates an order from a cart snapshot, atomically.
    ///
    /// Inserts the order and its items, decrements each size variant's
    /// stock (conditional on availability), and deletes the cart, all in
    /// one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::StockExhausted)` - some line lost the race for
    ///   stock; nothing was committed and the cart is left intact
    pub async fn create_checked(
        &self,
        order: &Order,
        items: &[OrderItem],
        cart_id: &str,
    ) -> DbResult<()> {
        debug!(id = %order.id, user_id = %order.user_id, total = %order.total, "Creating order");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, total, discount_pct,
                street, city, postal_code, country,
                status, expected_delivery, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.total)
        .bind(order.discount_pct)
        .bind(&order.delivery_address.street)
        .bind(&order.delivery_address.city)
        .bind(&order.delivery_address.postal_code)
        .bind(&order.delivery_address.country)
        .bind(order.status)
        .bind(order.expected_delivery)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            decrement_stock(&mut tx, &item.product_id, item.size, item.quantity).await?;

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, size, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(item.size)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        // Checkout destroys the cart; it is never emptied in place.
        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Updates an order's status (admin path, transition pre-validated by
    /// the service), optionally with a new expected delivery date.
    pub async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        expected_delivery: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(order_id = %order_id, status = %status, "Updating order status");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                expected_delivery = COALESCE(?3, expected_delivery),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(expected_delivery)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    /// Cancels a pending order and restocks its line items, atomically.
    ///
    /// The status flip is conditional on `status = 'pending'`, so a
    /// concurrent payment or shipment wins the race and the cancellation
    /// reports a precondition failure.
    pub async fn cancel_restock(&self, order_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(order_id = %order_id, "Cancelling order");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE orders SET status = 'cancelled', updated_at = ?2 WHERE id = ?1 AND status = 'pending'",
        )
        .bind(order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::PreconditionFailed(
                "only pending orders can be cancelled".to_string(),
            ));
        }

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, size, quantity FROM order_items WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for item in &items {
            restock(&mut tx, &item.product_id, item.size, item.quantity).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Order count and pre-discount XOF sum for a user (rewards view).
    pub async fn totals_for_user(&self, user_id: &str) -> DbResult<(i64, i64)> {
        let row: (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), SUM(total) FROM orders WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.0, row.1.unwrap_or(0)))
    }
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}
