//! Client for the invoicing microservice.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::AppResult;

/// Payload accepted by `POST /invoice/create-and-send`.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: i64,
    pub quantity: i32,
    pub amount: i64,
    pub product: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct InvoiceClient {
    client: reqwest::Client,
    url: String,
}

impl InvoiceClient {
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// POST the invoice once. A non-2xx answer is only logged.
    pub async fn send(&self, invoice: &Invoice) -> AppResult<()> {
        let resp = self.client.post(&self.url).json(invoice).send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status.is_success() {
            tracing::info!(order_id = invoice.id, %status, %body, "invoice sent");
        } else {
            tracing::warn!(order_id = invoice.id, %status, %body, "invoicing service rejected invoice");
        }
        Ok(())
    }

    /// Send in a detached task; the order is already committed.
    pub fn notify(&self, invoice: Invoice) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(err) = client.send(&invoice).await {
                tracing::error!(order_id = invoice.id, error = ?err, "failed to notify invoicing service");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::State, routing::post};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

    fn invoice() -> Invoice {
        Invoice {
            id: 42,
            quantity: 1,
            amount: 1000,
            product: "Widget".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            created_at: Utc::now(),
        }
    }

    async fn stub_invoicer(captured: Captured) -> String {
        let app = Router::new()
            .route(
                "/invoice/create-and-send",
                post(
                    |State(captured): State<Captured>, Json(body): Json<serde_json::Value>| async move {
                        captured.lock().unwrap().push(body);
                        Json(serde_json::json!({ "error": false, "message": "sent" }))
                    },
                ),
            )
            .with_state(captured);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/invoice/create-and-send")
    }

    #[tokio::test]
    async fn notify_posts_the_order_as_json() {
        let captured: Captured = Arc::default();
        let client = InvoiceClient::new(stub_invoicer(captured.clone()).await).unwrap();

        client.notify(invoice()).await.unwrap();

        let bodies = captured.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["id"], 42);
        assert_eq!(bodies[0]["product"], "Widget");
        assert_eq!(bodies[0]["email"], "ada@example.com");
        assert!(bodies[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn unreachable_service_is_an_upstream_error() {
        let client = InvoiceClient::new("http://127.0.0.1:9/invoice/create-and-send").unwrap();
        let err = client.send(&invoice()).await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Upstream(_)));

        // the detached task swallows the same failure
        client.notify(invoice()).await.unwrap();
    }
}
