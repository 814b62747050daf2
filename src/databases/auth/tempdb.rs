use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::databases::auth::temp_user::{PendingRow, PendingSignup};
use crate::databases::auth::PendingStore;
use crate::error::StoreError;

pub struct PgPendingStore {
    pool: PgPool,
}

impl PgPendingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingStore for PgPendingStore {
    async fn upsert(&self, pending: &PendingSignup) -> Result<(), StoreError> {
        let profile = &pending.profile;

        sqlx::query(
            r#"
            INSERT INTO pending_signups (phone, code, name, email, password_hash, gender, city, state,
                                         country, expires_at, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (phone) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                gender = EXCLUDED.gender,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                country = EXCLUDED.country,
                expires_at = EXCLUDED.expires_at,
                attempts = EXCLUDED.attempts,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&pending.phone)
        .bind(&pending.code)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.password_hash)
        .bind(profile.gender.as_str())
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.country)
        .bind(pending.expires_at)
        .bind(pending.attempts)
        .bind(pending.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, phone: &str) -> Result<Option<PendingSignup>, StoreError> {
        let row = sqlx::query_as::<_, PendingRow>(
            r#"
            SELECT phone, code, name, email, password_hash, gender, city, state, country,
                   expires_at, attempts, created_at
            FROM pending_signups
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PendingSignup::try_from).transpose()?)
    }

    async fn increment_attempts(&self, phone: &str) -> Result<Option<i32>, StoreError> {
        let attempts: Option<(i32,)> = sqlx::query_as(
            "UPDATE pending_signups SET attempts = attempts + 1 WHERE phone = $1 RETURNING attempts",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempts.map(|(n,)| n))
    }

    async fn delete(&self, phone: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pending_signups WHERE phone = $1")
            .bind(phone)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM pending_signups WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
