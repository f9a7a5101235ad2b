use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Widget {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub inventory_level: i32,
    pub price: i64,
    pub image: String,
    pub is_recurring: bool,
    pub plan_id: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub widget_id: i64,
    pub transaction_id: i64,
    pub customer_id: i64,
    pub status_id: i32,
    pub quantity: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub widget: Option<WidgetSummary>,
    pub transaction: Option<TransactionSummary>,
    pub customer: Option<Customer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WidgetSummary {
    pub id: i64,
    pub name: String,
    pub is_recurring: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionSummary {
    pub id: i64,
    pub amount: i64,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub payment_intent: String,
    pub bank_return_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rows of the `statuses` lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum OrderStatus {
    Pending = 1,
    Refunded = 2,
    Cancelled = 3,
}

impl OrderStatus {
    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Rows of the `transaction_statuses` lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TransactionStatus {
    Pending = 1,
    Charged = 2,
    Declined = 3,
    Refunded = 4,
    PartiallyRefunded = 5,
}

impl TransactionStatus {
    pub fn id(self) -> i32 {
        self as i32
    }
}

/// One-time sales versus subscription plans, keyed on `widgets.is_recurring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Sale,
    Subscription,
}

impl OrderType {
    pub fn is_recurring(self) -> bool {
        matches!(self, OrderType::Subscription)
    }
}
