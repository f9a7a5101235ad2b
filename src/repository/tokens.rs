use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};

use crate::{
    db::{DbPool, OrmConn, bounded},
    entity::tokens::ActiveModel as TokenActive,
    error::AppResult,
    models::User,
};

#[derive(Debug, Clone)]
pub struct NewToken {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub token_hash: Vec<u8>,
    pub expiry: DateTime<Utc>,
}

pub async fn insert_token(orm: &OrmConn, token: NewToken) -> AppResult<i64> {
    let now = Utc::now();
    let model = bounded(
        TokenActive {
            id: NotSet,
            user_id: Set(token.user_id),
            name: Set(token.name),
            email: Set(token.email),
            token_hash: Set(token.token_hash),
            expiry: Set(token.expiry.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm),
    )
    .await?;
    Ok(model.id)
}

/// Resolve an unexpired token hash to its owner.
pub async fn get_user_for_token(pool: &DbPool, token_hash: &[u8]) -> AppResult<Option<User>> {
    let row: Option<(i64, String, String, String, DateTime<Utc>, DateTime<Utc>)> = bounded(
        sqlx::query_as(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.email, u.created_at, u.updated_at
            FROM users u
                INNER JOIN tokens t ON (t.user_id = u.id)
            WHERE t.token_hash = $1 AND t.expiry > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool),
    )
    .await?;

    Ok(row.map(
        |(id, first_name, last_name, email, created_at, updated_at)| User {
            id,
            first_name,
            last_name,
            email,
            password: String::new(),
            created_at,
            updated_at,
        },
    ))
}
