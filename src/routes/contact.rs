use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::SmtpConfig;
use crate::error::AuthError;
use crate::services::email::{send_contact_email, ContactMessage};

pub async fn contact(
    form: web::Json<ContactMessage>,
    smtp: web::Data<SmtpConfig>,
) -> Result<HttpResponse, AuthError> {
    send_contact_email(&smtp, &form).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.route("/contact", web::post().to(contact));
}
