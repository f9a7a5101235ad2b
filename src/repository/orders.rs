use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};

use crate::{
    db::{DbPool, OrmConn, bounded},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::{AppError, AppResult},
    models::{Customer, Order, OrderStatus, OrderType, TransactionSummary, WidgetSummary},
};

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub widget_id: i64,
    pub transaction_id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub quantity: i32,
    pub amount: i64,
}

/// One page of orders plus the counters the listing pages need.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub last_page: i64,
    pub total_records: i64,
}

const ORDER_SELECT: &str = r#"
    SELECT
        o.id, o.widget_id, o.transaction_id, o.customer_id, o.status_id, o.quantity, o.amount,
        o.created_at, o.updated_at,
        w.id AS w_id, w.name AS w_name, w.is_recurring AS w_is_recurring,
        t.id AS t_id, t.amount AS t_amount, t.currency AS t_currency, t.last_four AS t_last_four,
        t.expiry_month AS t_expiry_month, t.expiry_year AS t_expiry_year,
        t.payment_intent AS t_payment_intent, t.bank_return_code AS t_bank_return_code,
        c.id AS c_id, c.first_name AS c_first_name, c.last_name AS c_last_name, c.email AS c_email
    FROM orders o
        LEFT JOIN widgets w ON (o.widget_id = w.id)
        LEFT JOIN transactions t ON (o.transaction_id = t.id)
        LEFT JOIN customers c ON (o.customer_id = c.id)
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    widget_id: i64,
    transaction_id: i64,
    customer_id: i64,
    status_id: i32,
    quantity: i32,
    amount: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    w_id: Option<i64>,
    w_name: Option<String>,
    w_is_recurring: Option<bool>,
    t_id: Option<i64>,
    t_amount: Option<i64>,
    t_currency: Option<String>,
    t_last_four: Option<String>,
    t_expiry_month: Option<i32>,
    t_expiry_year: Option<i32>,
    t_payment_intent: Option<String>,
    t_bank_return_code: Option<String>,
    c_id: Option<i64>,
    c_first_name: Option<String>,
    c_last_name: Option<String>,
    c_email: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let widget = row.w_id.map(|id| WidgetSummary {
            id,
            name: row.w_name.unwrap_or_default(),
            is_recurring: row.w_is_recurring.unwrap_or_default(),
        });
        let transaction = row.t_id.map(|id| TransactionSummary {
            id,
            amount: row.t_amount.unwrap_or_default(),
            currency: row.t_currency.unwrap_or_default(),
            last_four: row.t_last_four.unwrap_or_default(),
            expiry_month: row.t_expiry_month.unwrap_or_default(),
            expiry_year: row.t_expiry_year.unwrap_or_default(),
            payment_intent: row.t_payment_intent.unwrap_or_default(),
            bank_return_code: row.t_bank_return_code.unwrap_or_default(),
        });
        let customer = row.c_id.map(|id| Customer {
            id,
            first_name: row.c_first_name.unwrap_or_default(),
            last_name: row.c_last_name.unwrap_or_default(),
            email: row.c_email.unwrap_or_default(),
        });

        Order {
            id: row.id,
            widget_id: row.widget_id,
            transaction_id: row.transaction_id,
            customer_id: row.customer_id,
            status_id: row.status_id,
            quantity: row.quantity,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
            widget,
            transaction,
            customer,
        }
    }
}

/// Insert an order and return its id.
pub async fn insert_order(pool: &DbPool, order: &NewOrder) -> AppResult<i64> {
    let (id,): (i64,) = bounded(
        sqlx::query_as(
            r#"
            INSERT INTO orders
                (widget_id, transaction_id, status_id, quantity, amount, customer_id,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now(), now())
            RETURNING id
            "#,
        )
        .bind(order.widget_id)
        .bind(order.transaction_id)
        .bind(order.status.id())
        .bind(order.quantity)
        .bind(order.amount)
        .bind(order.customer_id)
        .fetch_one(pool),
    )
    .await?;
    Ok(id)
}

pub async fn get_order_by_id(pool: &DbPool, id: i64) -> AppResult<Order> {
    let sql = format!("{ORDER_SELECT} WHERE o.id = $1");
    let row: OrderRow = bounded(sqlx::query_as(&sql).bind(id).fetch_one(pool)).await?;
    Ok(row.into())
}

pub async fn get_all_orders(pool: &DbPool, order_type: OrderType) -> AppResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE w.is_recurring = $1 ORDER BY o.created_at DESC, o.id DESC");
    let rows: Vec<OrderRow> = bounded(
        sqlx::query_as(&sql)
            .bind(order_type.is_recurring())
            .fetch_all(pool),
    )
    .await?;
    Ok(rows.into_iter().map(Order::from).collect())
}

pub async fn get_all_orders_paginated(
    pool: &DbPool,
    page_size: i64,
    page: i64,
    order_type: OrderType,
) -> AppResult<OrderPage> {
    let (limit, offset) = page_window(page_size, page)?;

    let sql = format!(
        "{ORDER_SELECT} WHERE w.is_recurring = $1 ORDER BY o.created_at DESC, o.id DESC LIMIT $2 OFFSET $3"
    );
    let rows: Vec<OrderRow> = bounded(
        sqlx::query_as(&sql)
            .bind(order_type.is_recurring())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool),
    )
    .await?;

    let (total_records,): (i64,) = bounded(
        sqlx::query_as(
            "SELECT count(o.id) FROM orders o LEFT JOIN widgets w ON (o.widget_id = w.id) WHERE w.is_recurring = $1",
        )
        .bind(order_type.is_recurring())
        .fetch_one(pool),
    )
    .await?;

    Ok(OrderPage {
        orders: rows.into_iter().map(Order::from).collect(),
        last_page: last_page(total_records, page_size),
        total_records,
    })
}

pub async fn update_order_status(orm: &OrmConn, id: i64, status: OrderStatus) -> AppResult<()> {
    let existing = bounded(Orders::find_by_id(id).one(orm)).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status_id = Set(status.id());
    active.updated_at = Set(Utc::now().into());
    bounded(active.update(orm)).await?;
    Ok(())
}

pub const MAX_PAGE_SIZE: i64 = 100;

/// `(limit, offset)` for a 1-based page.
pub fn page_window(page_size: i64, page: i64) -> AppResult<(i64, i64)> {
    if page_size < 1 {
        return Err(AppError::BadRequest("page_size must be at least 1".into()));
    }
    if page < 1 {
        return Err(AppError::BadRequest("page must be at least 1".into()));
    }
    if page_size > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "page_size must be at most {MAX_PAGE_SIZE}"
        )));
    }
    let offset = (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::BadRequest("page is out of range".into()))?;
    Ok((page_size, offset))
}

/// Floor division: a trailing partial page is not counted.
pub fn last_page(total_records: i64, page_size: i64) -> i64 {
    total_records / page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_of_ten_skips_first_ten_rows() {
        assert_eq!(page_window(10, 2).unwrap(), (10, 10));
        assert_eq!(page_window(10, 1).unwrap(), (10, 0));
        assert_eq!(page_window(25, 4).unwrap(), (25, 75));
    }

    #[test]
    fn invalid_windows_are_rejected() {
        assert!(matches!(page_window(0, 1), Err(AppError::BadRequest(_))));
        assert!(matches!(page_window(10, 0), Err(AppError::BadRequest(_))));
        assert!(matches!(page_window(101, 1), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn huge_page_numbers_are_rejected_not_wrapped() {
        assert!(matches!(page_window(10, i64::MAX), Err(AppError::BadRequest(_))));
        assert!(matches!(
            page_window(MAX_PAGE_SIZE, i64::MAX / 2),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(page_window(1, i64::MAX).unwrap(), (1, i64::MAX - 1));
    }

    #[test]
    fn last_page_uses_floor_division() {
        assert_eq!(last_page(30, 10), 3);
        assert_eq!(last_page(35, 10), 3);
        assert_eq!(last_page(9, 10), 0);
    }

    #[test]
    fn row_hydrates_missing_joins_as_none() {
        let now = Utc::now();
        let row = OrderRow {
            id: 1,
            widget_id: 2,
            transaction_id: 3,
            customer_id: 4,
            status_id: 1,
            quantity: 1,
            amount: 1000,
            created_at: now,
            updated_at: now,
            w_id: Some(2),
            w_name: Some("Triple Widget".into()),
            w_is_recurring: Some(false),
            t_id: None,
            t_amount: None,
            t_currency: None,
            t_last_four: None,
            t_expiry_month: None,
            t_expiry_year: None,
            t_payment_intent: None,
            t_bank_return_code: None,
            c_id: Some(4),
            c_first_name: Some("Grace".into()),
            c_last_name: Some("Hopper".into()),
            c_email: Some("grace@example.com".into()),
        };

        let order = Order::from(row);
        assert_eq!(order.widget.unwrap().name, "Triple Widget");
        assert!(order.transaction.is_none());
        assert_eq!(order.customer.unwrap().email, "grace@example.com");
    }
}
