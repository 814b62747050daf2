use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use stockschool::config::{OtpConfig, SmtpConfig};
use stockschool::databases::auth::memory::{MemoryPendingStore, MemoryUserStore};
use stockschool::databases::auth::{PendingStore, UserStore};
use stockschool::routes;
use stockschool::services::signup::AuthService;
use stockschool::services::sms::RecordingGateway;

const PHONE: &str = "9999999999";

struct Stores {
    pending: Arc<MemoryPendingStore>,
    users: Arc<MemoryUserStore>,
    gateway: Arc<RecordingGateway>,
}

fn stores() -> Stores {
    Stores {
        pending: Arc::new(MemoryPendingStore::new()),
        users: Arc::new(MemoryUserStore::new()),
        gateway: Arc::new(RecordingGateway::new()),
    }
}

fn smtp() -> SmtpConfig {
    SmtpConfig {
        email: "site@example.com".to_string(),
        password: "secret".to_string(),
        server: "127.0.0.1".to_string(),
        port: 2525,
        contact_inbox: "desk@example.com".to_string(),
    }
}

macro_rules! app {
    ($stores:expr) => {{
        let service = AuthService::new(
            $stores.pending.clone(),
            $stores.users.clone(),
            $stores.gateway.clone(),
            OtpConfig::default(),
        );
        test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .app_data(web::Data::new(smtp()))
                .configure(routes::init),
        )
        .await
    }};
}

fn profile(phone: &str, email: &str) -> Value {
    json!({
        "name": "Asha",
        "phone": phone,
        "email": email,
        "password": "longenough",
        "gender": "female",
        "city": "Pune",
        "state": "MH"
    })
}

fn other_code(code: &str) -> String {
    let other = if code == "999999" { "100000" } else { "999999" };
    other.to_string()
}

#[actix_web::test]
async fn signup_and_verify_creates_verified_user() {
    let s = stores();
    let app = app!(s);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(profile(PHONE, "a@b.com"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "success": true }));

    let code = s.gateway.last_code_for(PHONE).expect("code was sent");
    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let user = s.users.find_by_phone(PHONE).await.unwrap().unwrap();
    assert!(user.verified);
    assert!(s.pending.find(PHONE).await.unwrap().is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(s.users.len().await, 1);
}

#[actix_web::test]
async fn malformed_profile_is_bad_request() {
    let s = stores();
    let app = app!(s);

    let mut bad = profile("12ab", "not-an-email");
    bad["password"] = json!("short");
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(bad)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert!(s.pending.is_empty().await);
}

#[actix_web::test]
async fn unknown_gender_is_bad_request() {
    let s = stores();
    let app = app!(s);

    let mut bad = profile(PHONE, "a@b.com");
    bad["gender"] = json!("unspecified");
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(bad)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(s.gateway.sent().is_empty());
}

#[actix_web::test]
async fn sixth_attempt_is_rate_limited_even_when_correct() {
    let s = stores();
    let app = app!(s);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(profile(PHONE, "a@b.com"))
        .to_request();
    test::call_service(&app, req).await;
    let code = s.gateway.last_code_for(PHONE).unwrap();

    for attempt in 1..=5 {
        let req = test::TestRequest::post()
            .uri("/api/auth/verify")
            .set_json(json!({ "phone": PHONE, "code": other_code(&code) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let pending = s.pending.find(PHONE).await.unwrap().unwrap();
        assert_eq!(pending.attempts, attempt);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(s.pending.find(PHONE).await.unwrap().is_none());
    assert!(s.users.is_empty().await);
}

#[actix_web::test]
async fn repeated_signup_keeps_one_pending_and_latest_code() {
    let s = stores();
    let app = app!(s);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(profile(PHONE, "a@b.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert_eq!(s.pending.len().await, 1);
    let sent = s.gateway.sent();
    assert_eq!(sent.len(), 2);
    let (first, latest) = (sent[0].1.clone(), sent[1].1.clone());

    if first != latest {
        let req = test::TestRequest::post()
            .uri("/api/auth/verify")
            .set_json(json!({ "phone": PHONE, "code": first }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": latest }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn conflicting_account_is_conflict() {
    let s = stores();
    let app = app!(s);

    for phone in [PHONE, "8888888888"] {
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(profile(phone, "same@b.com"))
            .to_request();
        test::call_service(&app, req).await;
    }

    let code = s.gateway.last_code_for("8888888888").unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": "8888888888", "code": code }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let code = s.gateway.last_code_for(PHONE).unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(s.pending.find(PHONE).await.unwrap().is_none());
}

#[actix_web::test]
async fn login_otp_flow_over_http() {
    let s = stores();
    let app = app!(s);

    let req = test::TestRequest::post()
        .uri("/api/auth/login/otp")
        .set_json(json!({ "phone": PHONE }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(profile(PHONE, "a@b.com"))
        .to_request();
    test::call_service(&app, req).await;
    let code = s.gateway.last_code_for(PHONE).unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": code }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login/otp")
        .set_json(json!({ "phone": PHONE }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert!(s.pending.is_empty().await);

    let login_code = s.gateway.last_code_for(PHONE).unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/login/otp/verify")
        .set_json(json!({ "phone": PHONE, "code": login_code }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    assert!(body["userId"].is_string());
}

#[actix_web::test]
async fn password_login_over_http() {
    let s = stores();
    let app = app!(s);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(profile(PHONE, "a@b.com"))
        .to_request();
    test::call_service(&app, req).await;
    let code = s.gateway.last_code_for(PHONE).unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/verify")
        .set_json(json!({ "phone": PHONE, "code": code }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@b.com", "password": "wrongpassword" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "a@b.com", "password": "longenough" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn contact_form_is_validated_before_relay() {
    let s = stores();
    let app = app!(s);

    let req = test::TestRequest::post()
        .uri("/api/contact")
        .set_json(json!({ "name": "", "email": "x@y.com", "message": "hi" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}
