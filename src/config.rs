use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_SMS_ENDPOINT: &str = "https://www.fast2sms.com/dev/bulkV2";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub sweep_interval_secs: u64,
}

/// Settings for code generation and the SMS gateway.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub api_key: String,
    pub route: String,
    pub sender: String,
    pub template_id: String,
    pub endpoint: String,
    pub expiry_minutes: i64,
    pub attempt_limit: i32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            route: "dlt".to_string(),
            sender: String::new(),
            template_id: String::new(),
            endpoint: DEFAULT_SMS_ENDPOINT.to_string(),
            expiry_minutes: 15,
            attempt_limit: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub email: String,
    pub password: String,
    pub server: String,
    pub port: u16,
    pub contact_inbox: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub otp: OtpConfig,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    /// Reads the whole configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            otp: OtpConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            sweep_interval_secs: parse_or("PENDING_SWEEP_SECS", 60)?,
        })
    }
}

impl OtpConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let route = var_or("SMS_ROUTE", &defaults.route);
        // Only DLT sends reference a registered sender and template.
        let (sender, template_id) = if route == "dlt" {
            (required("SMS_SENDER_ID")?, required("SMS_TEMPLATE_ID")?)
        } else {
            (var_or("SMS_SENDER_ID", ""), var_or("SMS_TEMPLATE_ID", ""))
        };
        Ok(Self {
            api_key: required("SMS_API_KEY")?,
            route,
            sender,
            template_id,
            endpoint: var_or("SMS_API_URL", &defaults.endpoint),
            expiry_minutes: parse_or("OTP_EXPIRY_MINUTES", defaults.expiry_minutes)?,
            attempt_limit: parse_or("OTP_ATTEMPT_LIMIT", defaults.attempt_limit)?,
        })
    }
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self> {
        let email = required("SMTP_EMAIL")?;
        Ok(Self {
            password: required("SMTP_PASSWORD")?,
            server: var_or("SMTP_SERVER", "smtp.gmail.com"),
            port: parse_or("SMTP_PORT", 587)?,
            contact_inbox: var_or("CONTACT_INBOX", &email),
            email,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
