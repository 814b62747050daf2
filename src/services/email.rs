use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use log::{error, info};
use serde::Deserialize;
use validator::Validate;

use crate::config::SmtpConfig;
use crate::error::AuthError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "message must be 1 to 2000 characters"))]
    pub message: String,
}

fn contact_body(form: &ContactMessage) -> String {
    format!(
        "New enquiry from the website\n\nName: {}\nEmail: {}\nPhone: {}\n\n{}",
        form.name,
        form.email,
        form.phone.as_deref().unwrap_or("-"),
        form.message
    )
}

fn build_contact_email(smtp: &SmtpConfig, form: &ContactMessage) -> Result<Message, AuthError> {
    let from: Mailbox = smtp
        .email
        .parse()
        .map_err(|e| AuthError::Internal(format!("Invalid SMTP_EMAIL: {}", e)))?;
    let to: Mailbox = smtp
        .contact_inbox
        .parse()
        .map_err(|e| AuthError::Internal(format!("Invalid CONTACT_INBOX: {}", e)))?;
    let reply_to: Mailbox = form
        .email
        .parse()
        .map_err(|_| AuthError::Validation("email is not valid".to_string()))?;

    Message::builder()
        .from(from)
        .reply_to(reply_to)
        .to(to)
        .subject(format!("Website enquiry from {}", form.name))
        .header(header::ContentType::TEXT_PLAIN)
        .body(contact_body(form))
        .map_err(|e| AuthError::Internal(format!("Failed to build email: {}", e)))
}

/// Relays a validated contact form to the configured inbox over STARTTLS.
pub async fn send_contact_email(smtp: &SmtpConfig, form: &ContactMessage) -> Result<(), AuthError> {
    form.validate()?;
    let email = build_contact_email(smtp, form)?;

    let creds = Credentials::new(smtp.email.clone(), smtp.password.clone());

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)
        .map_err(|e| AuthError::Delivery(format!("SMTP relay setup failed: {}", e)))?
        .port(smtp.port)
        .credentials(creds)
        .build();

    match mailer.send(email).await {
        Ok(_) => {
            info!("✅ Contact enquiry relayed to {}", smtp.contact_inbox);
            Ok(())
        }
        Err(e) => {
            error!("❌ Failed to send contact email: {}", e);
            Err(AuthError::Delivery("email could not be sent".to_string()))
        }
    }
}
