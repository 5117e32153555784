//! # Product Repository
//!
//! Database operations for the jersey catalog and size-level stock.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compare in memory, write the new absolute value       │
//! │     (two concurrent checkouts both pass the read and oversell)        │
//! │                                                                         │
//! │  ✅ CORRECT: conditional delta update                                  │
//! │     UPDATE product_sizes SET quantity = quantity - n                   │
//! │     WHERE product_id = ? AND size = ? AND quantity >= n                │
//! │                                                                         │
//! │  Zero rows affected means the stock moved underneath us; the caller    │
//! │  aborts its transaction and nothing is committed.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tribune_core::{JerseySize, Product, ProductDetail, SizeVariant};

const PRODUCT_COLUMNS: &str = "id, title, description, price, discount_pct, featured, created_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID (without size variants).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product together with its size variants.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<ProductDetail>> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let sizes = self.sizes_for(id).await?;
        Ok(Some(ProductDetail { product, sizes }))
    }

    /// Gets the size variants of a product.
    pub async fn sizes_for(&self, product_id: &str) -> DbResult<Vec<SizeVariant>> {
        let sizes = sqlx::query_as::<_, SizeVariant>(
            "SELECT size, quantity FROM product_sizes WHERE product_id = ?1 ORDER BY size",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }

    /// Lists products (newest first).
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let query =
            format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT ?1");
        let products = sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a product and its size variants in one transaction.
    pub async fn insert(&self, product: &Product, sizes: &[SizeVariant]) -> DbResult<()> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, description, price, discount_pct, featured, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_pct)
        .bind(product.featured)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await?;

        for variant in sizes {
            sqlx::query(
                "INSERT INTO product_sizes (product_id, size, quantity) VALUES (?1, ?2, ?3)",
            )
            .bind(&product.id)
            .bind(variant.size)
            .bind(variant.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Sets the absolute stock level of a size variant (admin restock).
    pub async fn set_stock(
        &self,
        product_id: &str,
        size: JerseySize,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, size = %size, quantity, "Setting stock");

        let result = sqlx::query(
            r#"
            INSERT INTO product_sizes (product_id, size, quantity) VALUES (?1, ?2, ?3)
            ON CONFLICT (product_id, size) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(product_id)
        .bind(size)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }
}

/// Decrements a size variant's stock if and only if enough is available.
///
/// Runs on a borrowed transaction connection so checkout can bundle the
/// decrement with order creation. Zero rows affected maps to
/// [`DbError::StockExhausted`]; the caller must abort its transaction.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    size: JerseySize,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE product_sizes
        SET quantity = quantity - ?3
        WHERE product_id = ?1 AND size = ?2 AND quantity >= ?3
        "#,
    )
    .bind(product_id)
    .bind(size)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StockExhausted {
            product_id: product_id.to_string(),
            size: size.label().to_string(),
        });
    }

    Ok(())
}

/// Returns a size variant's stock to the pool (order cancellation).
pub(crate) async fn restock(
    conn: &mut SqliteConnection,
    product_id: &str,
    size: JerseySize,
    quantity: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE product_sizes
        SET quantity = quantity + ?3
        WHERE product_id = ?1 AND size = ?2
        "#,
    )
    .bind(product_id)
    .bind(size)
    .bind(quantity)
    .execute(conn)
    .await?;

    Ok(())
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
