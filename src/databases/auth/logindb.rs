use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::databases::auth::temp_user::{CandidateProfile, Gender};
use crate::databases::auth::UserStore;
use crate::error::StoreError;

/// A verified account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub city: String,
    pub state: String,
    pub country: Option<String>,
    pub verified: bool,
    pub otp: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    /// Wrong guesses against the current login code.
    pub otp_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds the account row for a phone whose code has just been confirmed.
    pub fn from_verified_signup(phone: &str, profile: CandidateProfile, now: DateTime<Utc>) -> Self {
        User {
            id: Uuid::new_v4(),
            name: profile.name,
            phone: phone.to_string(),
            email: profile.email,
            password_hash: profile.password_hash,
            gender: profile.gender,
            city: profile.city,
            state: profile.state,
            country: profile.country,
            verified: true,
            otp: None,
            otp_expiry: None,
            otp_attempts: 0,
            created_at: now,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
    pub city: String,
    pub state: String,
    pub country: Option<String>,
    pub verified: bool,
    pub otp: Option<String>,
    pub otp_expiry: Option<DateTime<Utc>>,
    pub otp_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .parse::<Gender>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(User {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            password_hash: row.password_hash,
            gender,
            city: row.city,
            state: row.state,
            country: row.country,
            verified: row.verified,
            otp: row.otp,
            otp_expiry: row.otp_expiry,
            otp_attempts: row.otp_attempts,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, phone, email, password_hash, gender, city, state, country, \
                            verified, otp, otp_expiry, otp_attempts, created_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::try_from).transpose()?)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn exists(&self, email: &str, phone: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("SELECT 1 FROM users WHERE email = $1 OR phone = $2")
            .bind(email)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result.is_some())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, phone, email, password_hash, gender, city, state, country,
                               verified, otp, otp_expiry, otp_attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.gender.as_str())
        .bind(&user.city)
        .bind(&user.state)
        .bind(&user.country)
        .bind(user.verified)
        .bind(&user.otp)
        .bind(user.otp_expiry)
        .bind(user.otp_attempts)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("phone", phone).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_one_where("email", email).await
    }

    async fn set_login_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET otp = $2, otp_expiry = $3, otp_attempts = 0 WHERE id = $1")
            .bind(id)
            .bind(code)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear_login_otp(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET otp = NULL, otp_expiry = NULL, otp_attempts = 0 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_login_attempts(&self, id: Uuid) -> Result<Option<i32>, StoreError> {
        let attempts: Option<(i32,)> = sqlx::query_as(
            "UPDATE users SET otp_attempts = otp_attempts + 1 \
             WHERE id = $1 AND otp IS NOT NULL RETURNING otp_attempts",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempts.map(|(n,)| n))
    }
}
