//! Cookie sessions on `tower-sessions`.
//!
//! Everything the application remembers about a visitor is one typed
//! [`SessionData`] value stored under [`DATA_KEY`]. Handlers take the
//! `tower_sessions::Session` extractor and go through the helpers here.

use std::time::Duration as StdDuration;

use axum::Router;
use serde::{Deserialize, Serialize};
use time::Duration;
use tokio::task::JoinHandle;
use tower_sessions::{
    ExpiredDeletion, Expiry, MemoryStore, Session, SessionManagerLayer, SessionStore,
    cookie::SameSite,
};
use tower_sessions_sqlx_store::PostgresStore;

use crate::{config::SessionBackend, db::DbPool, dto::checkout::Receipt, error::AppResult};

pub const SESSION_COOKIE: &str = "session";
pub const DATA_KEY: &str = "app";

/// How often the Postgres store purges expired rows.
pub const EXPIRED_SWEEP_PERIOD: StdDuration = StdDuration::from_secs(60);

pub fn session_lifetime() -> Duration {
    Duration::hours(24)
}

/// Everything the application keeps in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Transient; removed when the receipt page reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// HttpOnly, `SameSite=Lax` cookie named [`SESSION_COOKIE`] that expires
/// after a day without requests.
pub fn session_layer<S>(store: S, secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(session_lifetime()))
}

/// Wrap `router` in the configured session backend. Postgres creates its
/// table on first use and starts the expired-row sweep.
pub async fn attach_sessions<T>(
    router: Router<T>,
    backend: SessionBackend,
    pool: &DbPool,
    secure: bool,
) -> AppResult<Router<T>>
where
    T: Clone + Send + Sync + 'static,
{
    match backend {
        SessionBackend::Postgres => {
            let store = PostgresStore::new(pool.clone());
            store.migrate().await?;
            spawn_expired_sweep(store.clone());
            Ok(router.layer(session_layer(store, secure)))
        }
        SessionBackend::Memory => Ok(router.layer(session_layer(MemoryStore::default(), secure))),
    }
}

pub fn spawn_expired_sweep(store: PostgresStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = store.continuously_delete_expired(EXPIRED_SWEEP_PERIOD).await {
            tracing::error!(error = %err, "expired session sweep stopped");
        }
    })
}

pub async fn load(session: &Session) -> AppResult<SessionData> {
    Ok(session.get::<SessionData>(DATA_KEY).await?.unwrap_or_default())
}

async fn store(session: &Session, data: &SessionData) -> AppResult<()> {
    session.insert(DATA_KEY, data).await?;
    Ok(())
}

pub async fn put_receipt(session: &Session, receipt: Receipt) -> AppResult<()> {
    let mut data = load(session).await?;
    data.receipt = Some(receipt);
    store(session, &data).await
}

/// Read and clear the receipt.
pub async fn take_receipt(session: &Session) -> AppResult<Option<Receipt>> {
    let mut data = load(session).await?;
    let receipt = data.receipt.take();
    if receipt.is_some() {
        store(session, &data).await?;
    }
    Ok(receipt)
}

pub async fn set_user_id(session: &Session, user_id: i64) -> AppResult<()> {
    let mut data = load(session).await?;
    data.user_id = Some(user_id);
    store(session, &data).await
}

pub async fn user_id(session: &Session) -> AppResult<Option<i64>> {
    Ok(load(session).await?.user_id)
}

/// Move the data to a fresh session id; the old id stops working.
pub async fn renew_token(session: &Session) -> AppResult<()> {
    session.cycle_id().await?;
    Ok(())
}

/// Drop all session data and the stored record. The next write gets a new id.
pub async fn destroy(session: &Session) -> AppResult<()> {
    session.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Json,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    fn receipt() -> Receipt {
        Receipt {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            payment_intent: "pi_123".into(),
            payment_method: "pm_123".into(),
            amount: 1000,
            currency: "cad".into(),
            last_four: "4242".into(),
            expiry_month: 12,
            expiry_year: 2030,
            bank_return_code: "ch_123".into(),
        }
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/put",
                get(|session: Session| async move {
                    put_receipt(&session, receipt()).await.unwrap();
                    StatusCode::OK
                }),
            )
            .route(
                "/take",
                get(|session: Session| async move {
                    let found = take_receipt(&session).await.unwrap();
                    Json(found.map(|r| r.payment_intent))
                }),
            )
            .route(
                "/login",
                get(|session: Session| async move {
                    renew_token(&session).await.unwrap();
                    set_user_id(&session, 9).await.unwrap();
                    StatusCode::OK
                }),
            )
            .layer(session_layer(MemoryStore::default(), false))
    }

    async fn call(app: &Router, path: &str, cookie: Option<&str>) -> axum::response::Response {
        let mut req = Request::get(path);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        app.clone().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    fn session_cookie(resp: &axum::response::Response) -> String {
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[test]
    fn payload_uses_documented_keys() {
        let data = SessionData {
            receipt: None,
            user_id: Some(3),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({ "userID": 3 }));
        let back: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[tokio::test]
    async fn cookie_carries_configured_attributes() {
        let resp = call(&app(), "/put", None).await;
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn receipt_is_read_once() {
        let app = app();
        let cookie = session_cookie(&call(&app, "/put", None).await);

        let first = call(&app, "/take", Some(&cookie)).await;
        let body = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#""pi_123""#);

        let second = call(&app, "/take", Some(&cookie)).await;
        let body = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"null");
    }

    #[tokio::test]
    async fn renew_token_issues_new_id() {
        let app = app();
        let first = session_cookie(&call(&app, "/put", None).await);
        let second = session_cookie(&call(&app, "/login", Some(&first)).await);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn destroy_clears_user_and_id() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_user_id(&session, 1).await.unwrap();
        session.save().await.unwrap();
        assert!(session.id().is_some());

        destroy(&session).await.unwrap();
        assert!(session.id().is_none());
        assert_eq!(user_id(&session).await.unwrap(), None);
    }
}
