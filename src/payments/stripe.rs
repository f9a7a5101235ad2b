//! Stripe REST client (no SDK dependency).

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;

use super::{PaymentGateway, PaymentIntent, PaymentMethod, Refund};
use crate::{
    config::StripeConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(config: &StripeConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            secret: config.secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let resp = self
            .client
            .get(self.url(path))
            .basic_auth(&self.secret, None::<&str>)
            .send()
            .await?;
        decode(resp).await
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn retrieve_payment_intent(&self, id: &str) -> AppResult<PaymentIntent> {
        check_id(id)?;
        self.get_json(&format!("/v1/payment_intents/{id}")).await
    }

    async fn get_payment_method(&self, id: &str) -> AppResult<PaymentMethod> {
        check_id(id)?;
        self.get_json(&format!("/v1/payment_methods/{id}")).await
    }

    async fn refund(&self, payment_intent: &str, amount: i64) -> AppResult<Refund> {
        check_id(payment_intent)?;
        let amount = amount.to_string();
        let resp = self
            .client
            .post(self.url("/v1/refunds"))
            .basic_auth(&self.secret, None::<&str>)
            .form(&[("payment_intent", payment_intent), ("amount", amount.as_str())])
            .send()
            .await?;
        decode(resp).await
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> AppResult<()> {
        check_id(subscription_id)?;
        let resp = self
            .client
            .delete(self.url(&format!("/v1/subscriptions/{subscription_id}")))
            .basic_auth(&self.secret, None::<&str>)
            .send()
            .await?;
        let _: serde_json::Value = decode(resp).await?;
        Ok(())
    }
}

/// Stripe ids are `prefix_alnum`; anything else would change the request path.
fn check_id(id: &str) -> AppResult<()> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(AppError::BadRequest(format!("invalid payment reference {id:?}")));
    }
    Ok(())
}

async fn decode<T: DeserializeOwned>(resp: Response) -> AppResult<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let message = body["error"]["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_string();
    tracing::warn!(%status, %message, "stripe request failed");
    Err(AppError::PaymentGateway(format!("{status}: {message}")))
}
