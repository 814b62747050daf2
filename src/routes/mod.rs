use actix_web::{error, web, HttpRequest};
use log::warn;

use crate::error::AuthError;

pub mod auth;
pub mod contact;
pub mod login;
pub mod verify;

/// Turns malformed JSON bodies (missing fields, unknown gender) into `AuthError::Validation`.
fn json_error_handler(err: error::JsonPayloadError, req: &HttpRequest) -> error::Error {
    warn!("Rejected JSON body on {}: {}", req.path(), err);
    AuthError::Validation(format!("invalid request body: {}", err)).into()
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(
            web::scope("/api/auth")
                .configure(auth::init)
                .configure(verify::init)
                .configure(login::init),
        )
        .service(web::scope("/api").configure(contact::init));
}
