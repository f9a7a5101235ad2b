use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use widget_checkout::{
    config::{AppConfig, SessionBackend, StripeConfig},
    encryption::Encryptor,
    invoice::InvoiceClient,
    mailer::LogMailer,
    payments::StripeGateway,
    routes::{create_api_router, create_web_router},
    session::session_layer,
    signer::UrlSigner,
    state::AppState,
};

const SECRET: &str = "abcdefghijklmnopqrstuvwxyz012345";

// Only exercises paths that fail or succeed before touching the database.
fn app() -> Router {
    let config = AppConfig {
        database_url: "postgres://localhost/unused".into(),
        host: "127.0.0.1".into(),
        port: 4000,
        stripe: StripeConfig {
            key: "pk_test".into(),
            secret: "sk_test".into(),
            api_base: "http://127.0.0.1:9".into(),
        },
        secret_key: SECRET.into(),
        front_end: "http://localhost:4000".into(),
        invoice_url: "http://127.0.0.1:9/invoice/create-and-send".into(),
        session_backend: SessionBackend::Memory,
        cookie_secure: false,
    };
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();

    let state = AppState {
        orm: widget_checkout::db::orm_from_pool(&pool),
        pool,
        payments: Arc::new(StripeGateway::new(&config.stripe).unwrap()),
        invoices: InvoiceClient::new(config.invoice_url.clone()).unwrap(),
        mailer: Arc::new(LogMailer),
        signer: UrlSigner::new(SECRET),
        encryptor: Encryptor::new(SECRET),
        config: Arc::new(config),
    };

    Router::new()
        .merge(create_web_router())
        .nest("/api", create_api_router())
        .layer(session_layer(MemoryStore::default(), false))
        .with_state(state)
}

fn location(resp: &axum::response::Response) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn receipt_without_session_redirects_home() {
    let resp = app()
        .oneshot(Request::get("/receipt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn admin_api_requires_credentials() {
    let resp = app()
        .oneshot(Request::get("/api/admin/all-users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app()
        .oneshot(
            Request::get("/api/admin/all-users")
                .header(header::AUTHORIZATION, "Basic abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_drops_stale_cookie_and_redirects_to_login() {
    let resp = app()
        .oneshot(
            Request::get("/logout")
                .header(header::COOKIE, "session=stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn logout_without_cookie_stores_nothing() {
    let resp = app()
        .oneshot(Request::get("/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn malformed_checkout_form_is_bad_request() {
    let resp = app()
        .oneshot(
            Request::post("/payment-succeeded")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "product_id=1&first_name=Ada&last_name=L&email=ada%40example.com\
                     &payment_intent=pi_1&payment_method=pm_1&payment_amount=ten&payment_currency=cad",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_reset_link_returns_encrypted_email() {
    let signed = UrlSigner::new(SECRET)
        .sign("http://localhost:4000/reset-password?email=ada%40example.com");
    let path = signed.trim_start_matches("http://localhost:4000");

    let resp = app()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let sealed = json["data"]["email"].as_str().unwrap();
    assert_eq!(Encryptor::new(SECRET).decrypt(sealed).unwrap(), "ada@example.com");
}

#[tokio::test]
async fn tampered_reset_link_is_forbidden() {
    let signed = UrlSigner::new(SECRET)
        .sign("http://localhost:4000/reset-password?email=ada%40example.com");
    let tampered = signed
        .trim_start_matches("http://localhost:4000")
        .replace("ada%40", "eve%40");

    let resp = app()
        .oneshot(Request::get(tampered).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
