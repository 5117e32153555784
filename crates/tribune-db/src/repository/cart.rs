//! # Cart Repository
//!
//! Database operations for carts and their line items.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │  1. FIRST ADD-TO-CART                                                  │
//! │     └── create() + upsert_item()                                       │
//! │                                                                         │
//! │  2. MUTATION                                                           │
//! │     └── upsert_item() merges quantity on (product, size) conflicts     │
//! │     └── set_item_quantity() / remove_item()                            │
//! │                                                                         │
//! │  3. LOGIN MERGE                                                        │
//! │     └── retarget_to_user() when the user has no cart yet               │
//! │     └── merge_items() otherwise (one transaction, then the session     │
//! │         cart is deleted)                                               │
//! │                                                                         │
//! │  4. CHECKOUT                                                           │
//! │     └── deleted inside the order-creation transaction                  │
//! │         (delete, never empty-in-place)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tribune_core::{Cart, CartItem, CartOwner, JerseySize};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Finds the cart for an owner (user or anonymous session).
    pub async fn get_by_owner(&self, owner: &CartOwner) -> DbResult<Option<Cart>> {
        let (column, value) = match owner {
            CartOwner::User(id) => ("user_id", id),
            CartOwner::Session(id) => ("session_id", id),
        };

        let query = format!(
            "SELECT id, user_id, session_id, updated_at FROM carts WHERE {column} = ?1"
        );
        let cart = sqlx::query_as::<_, Cart>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cart)
    }

    /// Inserts a new empty cart.
    pub async fn create(&self, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, "Creating cart");

        sqlx::query(
            "INSERT INTO carts (id, user_id, session_id, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(&cart.session_id)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets all line items of a cart.
    pub async fn get_items(&self, cart_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, size, quantity FROM cart_items WHERE cart_id = ?1",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a single line item by id.
    pub async fn get_item(&self, item_id: &str) -> DbResult<Option<CartItem>> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, size, quantity FROM cart_items WHERE id = ?1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Adds a line item, merging quantities when the (product, size) pair
    /// is already present.
    ///
    /// The UNIQUE(cart_id, product_id, size) constraint plus the upsert
    /// keeps duplicate pairs unrepresentable.
    pub async fn upsert_item(
        &self,
        cart_id: &str,
        product_id: &str,
        size: JerseySize,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(cart_id = %cart_id, product_id = %product_id, size = %size, quantity, "Adding cart item");

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, size, quantity)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (cart_id, product_id, size)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(cart_id)
        .bind(product_id)
        .bind(size)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        self.touch(cart_id, now).await
    }

    /// Replaces a line item's quantity.
    pub async fn set_item_quantity(&self, item_id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ?2 WHERE id = ?1")
            .bind(item_id)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart item", item_id));
        }

        Ok(())
    }

    /// Removes a line item.
    pub async fn remove_item(&self, item_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart item", item_id));
        }

        Ok(())
    }

    /// Deletes a cart (line items cascade).
    pub async fn delete(&self, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Deleting cart");

        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Hands a session cart over to a user (login merge, no user cart yet).
    pub async fn retarget_to_user(&self, cart_id: &str, user_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, user_id = %user_id, "Retargeting session cart to user");

        let result = sqlx::query(
            "UPDATE carts SET user_id = ?2, session_id = NULL WHERE id = ?1",
        )
        .bind(cart_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", cart_id));
        }

        Ok(())
    }

    /// Merges session-cart lines into a user cart and deletes the session
    /// cart, atomically.
    ///
    /// The caller decides which lines survive (stock-unsatisfiable lines
    /// are skipped at the service layer, matching the login-merge rules).
    pub async fn merge_items(
        &self,
        user_cart_id: &str,
        session_cart_id: &str,
        lines: &[(String, JerseySize, i64)],
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(
            user_cart = %user_cart_id,
            session_cart = %session_cart_id,
            lines = lines.len(),
            "Merging session cart into user cart"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (product_id, size, quantity) in lines {
            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, size, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (cart_id, product_id, size)
                DO UPDATE SET quantity = quantity + excluded.quantity
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_cart_id)
            .bind(product_id)
            .bind(*size)
            .bind(*quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(session_cart_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(user_cart_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Bumps a cart's updated_at timestamp.
    async fn touch(&self, cart_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(cart_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Generates a new cart ID.
pub fn generate_cart_id() -> String {
    Uuid::new_v4().to_string()
}
