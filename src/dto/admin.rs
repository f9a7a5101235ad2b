use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, User};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageRequest {
    pub page_size: i64,
    pub page: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPageResponse {
    pub current_page: i64,
    pub page_size: i64,
    pub last_page: i64,
    pub total_records: i64,
    pub orders: Vec<Order>,
}

/// Refunds and subscription cancellations act on a stored order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderActionRequest {
    pub id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Required when adding; when editing an empty value keeps the current password.
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
