use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::databases::auth::temp_user::validate_phone;
use crate::error::AuthError;
use crate::services::signup::AuthService;

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(equal = 6, message = "code must be 6 digits"))]
    pub code: String,
}

pub async fn verify(
    req: web::Json<VerifyRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    req.validate()?;
    service.verify_code(&req.phone, &req.code).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User verified and registered successfully"
    })))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.route("/verify", web::post().to(verify));
}
