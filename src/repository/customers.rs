use crate::{
    db::{DbPool, bounded},
    error::AppResult,
};

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Insert a customer and return its id.
pub async fn insert_customer(pool: &DbPool, customer: &NewCustomer) -> AppResult<i64> {
    let (id,): (i64,) = bounded(
        sqlx::query_as(
            r#"
            INSERT INTO customers (first_name, last_name, email, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING id
            "#,
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .fetch_one(pool),
    )
    .await?;
    Ok(id)
}
