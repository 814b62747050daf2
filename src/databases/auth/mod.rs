pub mod logindb;
pub mod memory;
pub mod temp_user;
pub mod tempdb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use logindb::User;
use temp_user::PendingSignup;

/// Storage for in-flight signups, keyed by phone number.
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// Inserts the record, or replaces every field of the existing one for the same phone.
    async fn upsert(&self, pending: &PendingSignup) -> Result<(), StoreError>;

    async fn find(&self, phone: &str) -> Result<Option<PendingSignup>, StoreError>;

    /// Bumps the failed-attempt counter and returns the new value, `None` if no record exists.
    async fn increment_attempts(&self, phone: &str) -> Result<Option<i32>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, phone: &str) -> Result<bool, StoreError>;

    /// Removes every record whose expiry is at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Storage for verified accounts. Phone and email are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists(&self, email: &str, phone: &str) -> Result<bool, StoreError>;

    /// Fails with `StoreError::Duplicate` when the phone or email is taken.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Stores a fresh login code and resets its attempt counter.
    async fn set_login_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn clear_login_otp(&self, id: Uuid) -> Result<(), StoreError>;

    /// Bumps the wrong-guess counter of the outstanding login code, `None` if there is none.
    async fn increment_login_attempts(&self, id: Uuid) -> Result<Option<i32>, StoreError>;
}
