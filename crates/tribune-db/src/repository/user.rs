//! # User Repository
//!
//! Database operations for user accounts, loyalty points and the referral
//! graph.
//!
//! ## Referral Redemption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               redeem_referral (ONE transaction)                         │
//! │                                                                         │
//! │  1. INSERT INTO referred_users (referrer, referee)                     │
//! │     └── PK violation → referee already recorded → abort                │
//! │  2. UPDATE referrer: +bonus to referral, loyalty, lifetime counters    │
//! │  3. UPDATE referee:  +bonus, record code                               │
//! │     └── WHERE referral_code_used IS NULL (set-once CAS)               │
//! │     └── zero rows → already redeemed concurrently → abort             │
//! │                                                                         │
//! │  Either every write commits or none does.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tribune_core::User;

/// Columns selected for a full `User` row.
const USER_COLUMNS: &str = "id, name, email, role, active, loyalty_points, referral_code, \
     referral_code_used, referral_points, total_earned, phone, created_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by their own referral code.
    pub async fn get_by_referral_code(&self, code: &str) -> DbResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE referral_code = ?1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email or referral code taken
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, email = %user.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, role, active, loyalty_points,
                referral_code, referral_code_used, referral_points,
                total_earned, phone, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.active)
        .bind(user.loyalty_points)
        .bind(&user.referral_code)
        .bind(&user.referral_code_used)
        .bind(user.referral_points)
        .bind(user.total_earned)
        .bind(&user.phone)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Checks whether `referrer_id` has already recorded `referred_id`.
    pub async fn has_referred(&self, referrer_id: &str, referred_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM referred_users WHERE referrer_id = ?1 AND referred_id = ?2",
        )
        .bind(referrer_id)
        .bind(referred_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Lists the ids of users referred by `referrer_id`.
    pub async fn referred_ids(&self, referrer_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT referred_id FROM referred_users WHERE referrer_id = ?1 ORDER BY created_at",
        )
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Applies a one-time referral redemption atomically.
    ///
    /// Both user rows and the referred-set insert commit in a single
    /// transaction; if any write fails, none are observable.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - (referrer, referee) pair exists
    /// * `Err(DbError::PreconditionFailed)` - referee already redeemed a
    ///   code concurrently (set-once guard touched zero rows)
    pub async fn redeem_referral(
        &self,
        referrer_id: &str,
        referee_id: &str,
        code: &str,
        referrer_bonus: i64,
        referee_bonus: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(referrer = %referrer_id, referee = %referee_id, "Redeeming referral code");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO referred_users (referrer_id, referred_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(referrer_id)
        .bind(referee_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users SET
                referral_points = referral_points + ?2,
                loyalty_points = loyalty_points + ?2,
                total_earned = total_earned + ?2
            WHERE id = ?1
            "#,
        )
        .bind(referrer_id)
        .bind(referrer_bonus)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                loyalty_points = loyalty_points + ?2,
                total_earned = total_earned + ?2,
                referral_code_used = ?3
            WHERE id = ?1 AND referral_code_used IS NULL
            "#,
        )
        .bind(referee_id)
        .bind(referee_bonus)
        .bind(code)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Rolls back the referrer credit and the referred-set insert.
            return Err(DbError::PreconditionFailed(
                "referral code already redeemed".to_string(),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Adds loyalty points to a user (standalone, outside any transaction).
    ///
    /// Accrual tied to a payment goes through
    /// `PaymentRepository::create_with_accrual` instead, which updates the
    /// balance in the same transaction as the payment row.
    pub async fn add_points(&self, user_id: &str, points: i64) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET loyalty_points = loyalty_points + ?2 WHERE id = ?1")
                .bind(user_id)
                .bind(points)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }
}

/// Generates a new user ID.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a referral code: `REF-` + 8 uppercase hex chars from a v4 UUID.
pub fn generate_referral_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("REF-{}", id[..8].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_referral_code_format() {
        let code = generate_referral_code();
        assert!(code.starts_with("REF-"));
        assert_eq!(code.len(), 12);
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
