use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_core::OsRng;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Uniform six-digit code in `100000..=999999`.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Compares a submitted code with the stored one without short-circuiting on the first mismatch.
pub fn codes_match(stored: &str, submitted: &str) -> bool {
    stored.as_bytes().ct_eq(submitted.as_bytes()).into()
}

pub fn expiry_from(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(minutes)
}

pub fn hash_password(raw_password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(raw_password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Internal(format!("Password hash parsing failed: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(raw_password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Keeps only the last four digits, for log lines.
pub fn mask_phone(phone: &str) -> String {
    let hidden = phone.chars().count().saturating_sub(4);
    phone
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}
