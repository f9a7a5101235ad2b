use crate::{
    db::{DbPool, bounded},
    error::{AppError, AppResult},
    models::TransactionStatus,
};

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: i64,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub payment_intent: String,
    pub payment_method: String,
    pub bank_return_code: String,
    pub status: TransactionStatus,
}

/// Insert a transaction and return its id.
pub async fn insert_transaction(pool: &DbPool, txn: &NewTransaction) -> AppResult<i64> {
    let (id,): (i64,) = bounded(
        sqlx::query_as(
            r#"
            INSERT INTO transactions
                (amount, currency, last_four, bank_return_code, transaction_status_id,
                 expiry_month, expiry_year, payment_intent, payment_method, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
            RETURNING id
            "#,
        )
        .bind(txn.amount)
        .bind(&txn.currency)
        .bind(&txn.last_four)
        .bind(&txn.bank_return_code)
        .bind(txn.status.id())
        .bind(txn.expiry_month)
        .bind(txn.expiry_year)
        .bind(&txn.payment_intent)
        .bind(&txn.payment_method)
        .fetch_one(pool),
    )
    .await?;
    Ok(id)
}

pub async fn update_transaction_status(
    pool: &DbPool,
    id: i64,
    status: TransactionStatus,
) -> AppResult<()> {
    let result = bounded(
        sqlx::query(
            "UPDATE transactions SET transaction_status_id = $1, updated_at = now() WHERE id = $2",
        )
        .bind(status.id())
        .bind(id)
        .execute(pool),
    )
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
