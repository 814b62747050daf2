use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::databases::auth::temp_user::validate_phone;
use crate::error::AuthError;
use crate::services::signup::AuthService;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginOtpRequest {
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginOtpVerifyRequest {
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(equal = 6, message = "code must be 6 digits"))]
    pub code: String,
}

pub async fn login(
    data: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    data.validate()?;
    let user_id = service.password_login(&data.email, &data.password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "userId": user_id
    })))
}

pub async fn request_login_otp(
    data: web::Json<LoginOtpRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    data.validate()?;
    service.request_login_otp(&data.phone).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub async fn verify_login_otp(
    data: web::Json<LoginOtpVerifyRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    data.validate()?;
    let user_id = service.verify_login_otp(&data.phone, &data.code).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "userId": user_id
    })))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(login))
        .route("/login/otp", web::post().to(request_login_otp))
        .route("/login/otp/verify", web::post().to(verify_login_otp));
}
