use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Widget;

/// Fields posted by the buy-once page after the card was charged.
/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CheckoutForm {
    pub product_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_intent: String,
    pub payment_method: String,
    pub payment_amount: String,
    pub payment_currency: String,
}

/// Receipt view model kept in the session between the form post and the
/// receipt page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Receipt {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_intent: String,
    pub payment_method: String,
    pub amount: i64,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub bank_return_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WidgetView {
    pub widget: Widget,
    /// Publishable payment key for the client-side card form.
    pub stripe_key: String,
}
