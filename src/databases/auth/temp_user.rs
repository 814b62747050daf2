use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender {:?}", other)),
        }
    }
}

/// Phone numbers are stored as bare digits, 10 to 15 of them.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits_only = phone.chars().all(|c| c.is_ascii_digit());
    if digits_only && (10..=15).contains(&phone.len()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("phone must be 10 to 15 digits".into());
        Err(err)
    }
}

/// Signup form as submitted by the client.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub gender: Gender,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "state is required"))]
    pub state: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub country: Option<String>,
}

/// Candidate account captured at signup time. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub city: String,
    pub state: String,
    pub country: Option<String>,
}

/// An in-flight signup, one per phone number.
#[derive(Debug, Clone)]
pub struct PendingSignup {
    pub phone: String,
    pub code: String,
    pub profile: CandidateProfile,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl PendingSignup {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Flat `pending_signups` row.
#[derive(Debug, sqlx::FromRow)]
pub struct PendingRow {
    pub phone: String,
    pub code: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
    pub city: String,
    pub state: String,
    pub country: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PendingRow> for PendingSignup {
    type Error = sqlx::Error;

    fn try_from(row: PendingRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .parse::<Gender>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(PendingSignup {
            phone: row.phone,
            code: row.code,
            profile: CandidateProfile {
                name: row.name,
                email: row.email,
                password_hash: row.password_hash,
                gender,
                city: row.city,
                state: row.state,
                country: row.country,
            },
            expires_at: row.expires_at,
            attempts: row.attempts,
            created_at: row.created_at,
        })
    }
}
