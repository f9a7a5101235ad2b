use crate::{
    db::{DbPool, OrmConn},
    dto::admin::{OrderPageResponse, PageRequest, UserList, UserRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, OrderType, TransactionStatus, User},
    payments::PaymentGateway,
    repository::{orders, transactions, users, users::UserDetails},
    response::{ApiResponse, Meta},
};

pub async fn list_orders(
    pool: &DbPool,
    order_type: OrderType,
    page: PageRequest,
) -> AppResult<ApiResponse<OrderPageResponse>> {
    let result = orders::get_all_orders_paginated(pool, page.page_size, page.page, order_type).await?;
    let meta = Meta::new(page.page, page.page_size, result.total_records);

    let data = OrderPageResponse {
        current_page: page.page,
        page_size: page.page_size,
        last_page: result.last_page,
        total_records: result.total_records,
        orders: result.orders,
    };
    Ok(ApiResponse::success("Orders", data, Some(meta)))
}

/// An order of the requested kind; a sale id asked for as a subscription is not found.
pub async fn get_order(
    pool: &DbPool,
    order_type: OrderType,
    id: i64,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(pool, order_type, id).await?;
    Ok(ApiResponse::success("Order found", order, Some(Meta::empty())))
}

async fn load_order(pool: &DbPool, order_type: OrderType, id: i64) -> AppResult<Order> {
    let order = orders::get_order_by_id(pool, id).await?;
    let recurring = order.widget.as_ref().map(|w| w.is_recurring);
    if recurring != Some(order_type.is_recurring()) {
        return Err(AppError::NotFound);
    }
    Ok(order)
}

fn ensure_pending(order: &Order) -> AppResult<()> {
    if order.status_id != OrderStatus::Pending.id() {
        return Err(AppError::BadRequest(format!(
            "order {} is no longer pending",
            order.id
        )));
    }
    Ok(())
}

/// Refund the full charged amount of a one-time sale.
pub async fn refund(
    pool: &DbPool,
    orm: &OrmConn,
    payments: &dyn PaymentGateway,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(pool, OrderType::Sale, id).await?;
    ensure_pending(&order)?;
    let charge = order.transaction.as_ref().ok_or(AppError::NotFound)?;

    let refund = payments.refund(&charge.payment_intent, charge.amount).await?;
    tracing::info!(order_id = id, refund_id = %refund.id, status = %refund.status, admin = user.user_id, "order refunded");

    orders::update_order_status(orm, id, OrderStatus::Refunded).await?;
    transactions::update_transaction_status(pool, order.transaction_id, TransactionStatus::Refunded).await?;

    let order = orders::get_order_by_id(pool, id).await?;
    Ok(ApiResponse::success("Refunded", order, Some(Meta::empty())))
}

/// Subscriptions keep their subscription id in the transaction's payment reference.
pub async fn cancel_subscription(
    pool: &DbPool,
    orm: &OrmConn,
    payments: &dyn PaymentGateway,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(pool, OrderType::Subscription, id).await?;
    ensure_pending(&order)?;
    let charge = order.transaction.as_ref().ok_or(AppError::NotFound)?;

    payments.cancel_subscription(&charge.payment_intent).await?;
    tracing::info!(order_id = id, admin = user.user_id, "subscription cancelled");

    orders::update_order_status(orm, id, OrderStatus::Cancelled).await?;

    let order = orders::get_order_by_id(pool, id).await?;
    Ok(ApiResponse::success("Cancelled", order, Some(Meta::empty())))
}

pub async fn all_users(orm: &OrmConn) -> AppResult<ApiResponse<UserList>> {
    let items = users::get_all_users(orm).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn one_user(orm: &OrmConn, id: i64) -> AppResult<ApiResponse<User>> {
    let user = users::get_one_user(orm, id).await?;
    Ok(ApiResponse::success("User found", user, Some(Meta::empty())))
}

fn validate_user(payload: &UserRequest) -> AppResult<UserDetails> {
    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    let email = payload.email.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::BadRequest("first and last name are required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }
    Ok(UserDetails {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
    })
}

/// `id == 0` adds a user; any other id edits that user. A non-empty
/// password is re-hashed in both cases.
pub async fn save_user(
    pool: &DbPool,
    orm: &OrmConn,
    id: i64,
    payload: UserRequest,
) -> AppResult<ApiResponse<User>> {
    let details = validate_user(&payload)?;

    let user = if id == 0 {
        if payload.password.is_empty() {
            return Err(AppError::BadRequest("password is required".into()));
        }
        let hash = crate::password::hash(&payload.password)?;
        users::add_user(orm, details, hash).await?
    } else {
        let user = users::edit_user(orm, id, details).await?;
        if !payload.password.is_empty() {
            let hash = crate::password::hash(&payload.password)?;
            users::update_password_for_user(pool, id, &hash).await?;
        }
        user
    };

    tracing::info!(user_id = user.id, created = id == 0, "user saved");
    Ok(ApiResponse::success("User saved", user, Some(Meta::empty())))
}

pub async fn delete_user(pool: &DbPool, id: i64) -> AppResult<ApiResponse<serde_json::Value>> {
    users::delete_user(pool, id).await?;
    tracing::info!(user_id = id, "user deleted");
    Ok(ApiResponse::success(
        "User deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::TransactionSummary;

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: 3,
            widget_id: 1,
            transaction_id: 2,
            customer_id: 1,
            status_id: status.id(),
            quantity: 1,
            amount: 1000,
            created_at: now,
            updated_at: now,
            widget: None,
            transaction: Some(TransactionSummary {
                id: 2,
                amount: 1000,
                currency: "cad".into(),
                last_four: "4242".into(),
                expiry_month: 1,
                expiry_year: 2030,
                payment_intent: "pi_1".into(),
                bank_return_code: "ch_1".into(),
            }),
            customer: None,
        }
    }

    #[test]
    fn only_pending_orders_can_change() {
        assert!(ensure_pending(&order(OrderStatus::Pending)).is_ok());
        assert!(matches!(
            ensure_pending(&order(OrderStatus::Refunded)),
            Err(AppError::BadRequest(_))
        ));
        assert!(ensure_pending(&order(OrderStatus::Cancelled)).is_err());
    }

    #[test]
    fn user_form_requires_names_and_email() {
        let ok = UserRequest {
            first_name: " Ada ".into(),
            last_name: "Lovelace".into(),
            email: "Ada@Example.com".into(),
            password: String::new(),
        };
        let details = validate_user(&ok).unwrap();
        assert_eq!(details.first_name, "Ada");

        let missing = UserRequest {
            first_name: String::new(),
            ..ok
        };
        assert!(matches!(validate_user(&missing), Err(AppError::BadRequest(_))));
    }
}
