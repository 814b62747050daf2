use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::databases::auth::logindb::User;
use crate::databases::auth::temp_user::PendingSignup;
use crate::databases::auth::{PendingStore, UserStore};
use crate::error::StoreError;

/// Process-local pending store. Used by tests and local runs without Postgres.
#[derive(Default)]
pub struct MemoryPendingStore {
    records: Mutex<HashMap<String, PendingSignup>>,
}

impl MemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl PendingStore for MemoryPendingStore {
    async fn upsert(&self, pending: &PendingSignup) -> Result<(), StoreError> {
        self.records
            .lock()
            .await
            .insert(pending.phone.clone(), pending.clone());
        Ok(())
    }

    async fn find(&self, phone: &str) -> Result<Option<PendingSignup>, StoreError> {
        Ok(self.records.lock().await.get(phone).cloned())
    }

    async fn increment_attempts(&self, phone: &str) -> Result<Option<i32>, StoreError> {
        let mut records = self.records.lock().await;
        Ok(records.get_mut(phone).map(|pending| {
            pending.attempts += 1;
            pending.attempts
        }))
    }

    async fn delete(&self, phone: &str) -> Result<bool, StoreError> {
        Ok(self.records.lock().await.remove(phone).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, pending| !pending.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}

/// Process-local user store enforcing the same phone/email uniqueness as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists(&self, email: &str, phone: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .any(|u| u.email == email || u.phone == phone))
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|u| u.email == user.email || u.phone == user.phone)
        {
            return Err(StoreError::Duplicate);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.phone == phone)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_login_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.users.lock().await.iter_mut().find(|u| u.id == id) {
            user.otp = Some(code.to_string());
            user.otp_expiry = Some(expires_at);
            user.otp_attempts = 0;
        }
        Ok(())
    }

    async fn clear_login_otp(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(user) = self.users.lock().await.iter_mut().find(|u| u.id == id) {
            user.otp = None;
            user.otp_expiry = None;
            user.otp_attempts = 0;
        }
        Ok(())
    }

    async fn increment_login_attempts(&self, id: Uuid) -> Result<Option<i32>, StoreError> {
        let mut users = self.users.lock().await;
        Ok(users
            .iter_mut()
            .find(|u| u.id == id && u.otp.is_some())
            .map(|user| {
                user.otp_attempts += 1;
                user.otp_attempts
            }))
    }
}
