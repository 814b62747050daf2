use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::databases::auth::temp_user::SignupData;
use crate::error::AuthError;
use crate::services::signup::AuthService;

pub async fn signup(
    data: web::Json<SignupData>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    service.request_signup(data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(signup));
}
