use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::OtpConfig;
use crate::databases::auth::logindb::User;
use crate::databases::auth::temp_user::{CandidateProfile, PendingSignup, SignupData};
use crate::databases::auth::{PendingStore, UserStore};
use crate::error::{AuthError, StoreError};
use crate::services::otp::{
    codes_match, expiry_from, generate_code, hash_password, mask_phone, verify_password,
};
use crate::services::sms::CodeGateway;

/// Phone-OTP signup and login workflow over the pending and user stores.
pub struct AuthService {
    pending: Arc<dyn PendingStore>,
    users: Arc<dyn UserStore>,
    gateway: Arc<dyn CodeGateway>,
    config: OtpConfig,
}

impl AuthService {
    pub fn new(
        pending: Arc<dyn PendingStore>,
        users: Arc<dyn UserStore>,
        gateway: Arc<dyn CodeGateway>,
        config: OtpConfig,
    ) -> Self {
        Self {
            pending,
            users,
            gateway,
            config,
        }
    }

    /// Validates the form, upserts the pending signup for its phone and sends a fresh code.
    ///
    /// Any earlier pending signup for the phone is replaced, including its attempt
    /// counter. The record is persisted before the send, so a delivery failure
    /// leaves it in place.
    pub async fn request_signup(&self, data: SignupData) -> Result<(), AuthError> {
        data.validate()?;

        let now = Utc::now();
        let code = generate_code();
        let password_hash = hash_password(&data.password)?;

        let pending = PendingSignup {
            phone: data.phone,
            code,
            profile: CandidateProfile {
                name: data.name,
                email: data.email,
                password_hash,
                gender: data.gender,
                city: data.city,
                state: data.state,
                country: data.country,
            },
            expires_at: expiry_from(now, self.config.expiry_minutes),
            attempts: 0,
            created_at: now,
        };

        self.pending.upsert(&pending).await?;
        info!("Pending signup stored for {}", mask_phone(&pending.phone));

        self.gateway.send_code(&pending.phone, &pending.code).await
    }

    /// Checks a submitted code against the pending signup and creates the user on a match.
    pub async fn verify_code(&self, phone: &str, code: &str) -> Result<(), AuthError> {
        let pending = self
            .pending
            .find(phone)
            .await?
            .ok_or_else(AuthError::no_pending_signup)?;

        let now = Utc::now();
        if pending.is_expired(now) {
            self.pending.delete(phone).await?;
            info!("Expired pending signup dropped for {}", mask_phone(phone));
            return Err(AuthError::no_pending_signup());
        }

        // Counted before comparing, so the attempt past the limit is refused even if correct.
        let attempts = self
            .pending
            .increment_attempts(phone)
            .await?
            .ok_or_else(AuthError::no_pending_signup)?;

        if attempts > self.config.attempt_limit {
            self.pending.delete(phone).await?;
            warn!(
                "Attempt limit reached for {}, pending signup purged",
                mask_phone(phone)
            );
            return Err(AuthError::RateLimited);
        }

        if !codes_match(&pending.code, code) {
            info!(
                "Wrong code for {} ({}/{})",
                mask_phone(phone),
                attempts,
                self.config.attempt_limit
            );
            return Err(AuthError::InvalidCode);
        }

        if self.users.exists(&pending.profile.email, phone).await? {
            self.pending.delete(phone).await?;
            warn!("Account already exists for {}", mask_phone(phone));
            return Err(AuthError::already_exists());
        }

        let user = User::from_verified_signup(phone, pending.profile, now);
        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => {
                self.pending.delete(phone).await?;
                warn!("Concurrent signup won the race for {}", mask_phone(phone));
                return Err(AuthError::already_exists());
            }
            Err(e) => return Err(e.into()),
        }

        self.pending.delete(phone).await?;
        info!("✅ User {} verified and registered", user.id);
        Ok(())
    }

    /// Sends a fresh login code to an existing, verified user.
    pub async fn request_login_otp(&self, phone: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_phone(phone)
            .await?
            .ok_or_else(AuthError::user_not_found)?;

        if !user.verified {
            return Err(AuthError::NotVerified);
        }

        let code = generate_code();
        let expires_at = expiry_from(Utc::now(), self.config.expiry_minutes);
        self.users.set_login_otp(user.id, &code, expires_at).await?;

        self.gateway.send_code(phone, &code).await
    }

    /// Consumes a login code. A used or expired code is cleared from the account, and so
    /// is one that has taken more wrong guesses than the attempt limit allows.
    pub async fn verify_login_otp(&self, phone: &str, code: &str) -> Result<Uuid, AuthError> {
        let user = self
            .users
            .find_by_phone(phone)
            .await?
            .ok_or_else(AuthError::user_not_found)?;

        if !user.verified {
            return Err(AuthError::NotVerified);
        }

        let (stored, expiry) = match (user.otp.as_deref(), user.otp_expiry) {
            (Some(stored), Some(expiry)) => (stored, expiry),
            _ => return Err(AuthError::NotFound("no login code requested".to_string())),
        };

        if expiry <= Utc::now() {
            self.users.clear_login_otp(user.id).await?;
            return Err(AuthError::InvalidCode);
        }

        let attempts = self
            .users
            .increment_login_attempts(user.id)
            .await?
            .ok_or_else(|| AuthError::NotFound("no login code requested".to_string()))?;

        if attempts > self.config.attempt_limit {
            self.users.clear_login_otp(user.id).await?;
            warn!(
                "Login code attempt limit reached for {}, code cleared",
                mask_phone(phone)
            );
            return Err(AuthError::RateLimited);
        }

        if !codes_match(stored, code) {
            return Err(AuthError::InvalidCode);
        }

        self.users.clear_login_otp(user.id).await?;
        info!("Login code accepted for user {}", user.id);
        Ok(user.id)
    }

    pub async fn password_login(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("No user found with that email".to_string()))?;

        if verify_password(password, &user.password_hash)? {
            Ok(user.id)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
