//! Payment processor seam. The checkout and admin flows only see
//! [`PaymentGateway`]; [`stripe::StripeGateway`] is the production client.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppResult;

pub mod stripe;

pub use stripe::StripeGateway;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub latest_charge: Option<String>,
    /// Present on older API versions instead of `latest_charge`.
    #[serde(default)]
    pub charges: Option<ChargeList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargeList {
    pub data: Vec<Charge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// Charge id reported back by the bank, if the intent was charged.
    pub fn bank_return_code(&self) -> Option<&str> {
        self.latest_charge.as_deref().or_else(|| {
            self.charges
                .as_ref()
                .and_then(|list| list.data.first())
                .map(|charge| charge.id.as_str())
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub last4: String,
    pub exp_month: i32,
    pub exp_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn retrieve_payment_intent(&self, id: &str) -> AppResult<PaymentIntent>;
    async fn get_payment_method(&self, id: &str) -> AppResult<PaymentMethod>;
    async fn refund(&self, payment_intent: &str, amount: i64) -> AppResult<Refund>;
    async fn cancel_subscription(&self, subscription_id: &str) -> AppResult<()>;
}
