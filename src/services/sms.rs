use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::Serialize;
use std::sync::Mutex;

use crate::config::OtpConfig;
use crate::error::AuthError;
use crate::services::otp::mask_phone;

/// Outbound channel for one-time codes. A send is a single attempt; no retries.
#[async_trait]
pub trait CodeGateway: Send + Sync {
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AuthError>;
}

#[derive(Serialize)]
struct SmsPayload<'a> {
    route: &'a str,
    sender_id: &'a str,
    message: &'a str,
    variables_values: &'a str,
    numbers: &'a str,
    flash: u8,
}

/// Fast2SMS bulk API client. Sender and template come from configuration only.
pub struct Fast2SmsGateway {
    client: Client,
    config: OtpConfig,
}

impl Fast2SmsGateway {
    pub fn new(config: OtpConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// DLT routes reference a registered template; other routes carry the text itself.
    fn message_text(&self, code: &str) -> String {
        if self.config.route == "dlt" {
            self.config.template_id.clone()
        } else {
            format!(
                "Your verification code is {}. It expires in {} minutes.",
                code, self.config.expiry_minutes
            )
        }
    }
}

#[async_trait]
impl CodeGateway for Fast2SmsGateway {
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AuthError> {
        let message = self.message_text(code);
        let payload = SmsPayload {
            route: &self.config.route,
            sender_id: &self.config.sender,
            message: &message,
            variables_values: code,
            numbers: phone,
            flash: 0,
        };

        let res = self
            .client
            .post(&self.config.endpoint)
            .header("authorization", &self.config.api_key)
            .json(&payload)
            .send()
            .await;

        match res {
            Ok(response) if response.status().is_success() => {
                info!("📨 Code sent to {}", mask_phone(phone));
                Ok(())
            }
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                error!("SMS gateway rejected send ({}): {}", status, text);
                Err(AuthError::Delivery(format!("gateway responded {}", status)))
            }
            Err(err) => {
                error!("Error calling SMS gateway: {:?}", err);
                Err(AuthError::Delivery("gateway unreachable".to_string()))
            }
        }
    }
}

/// Keeps every code it is asked to send instead of sending it.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose every send fails with `AuthError::Delivery`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_code_for(&self, phone: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(p, _)| p == phone)
            .map(|(_, code)| code)
    }
}

#[async_trait]
impl CodeGateway for RecordingGateway {
    async fn send_code(&self, phone: &str, code: &str) -> Result<(), AuthError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((phone.to_string(), code.to_string()));
        }
        if self.fail {
            return Err(AuthError::Delivery("gateway disabled".to_string()));
        }
        Ok(())
    }
}
