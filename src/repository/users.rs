use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, QueryOrder, Set};

use crate::{
    db::{DbPool, OrmConn, bounded},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::User,
};

#[derive(Debug, Clone)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

pub async fn get_user_by_email(pool: &DbPool, email: &str) -> AppResult<User> {
    let email = email.to_lowercase();
    let row: UserRow = bounded(
        sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, password, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(pool),
    )
    .await?;
    Ok(user_from_row(row))
}

/// Check `password` against the stored hash for `email` and return the user id.
pub async fn authenticate(pool: &DbPool, email: &str, password: &str) -> AppResult<i64> {
    let email = email.to_lowercase();
    let row: Option<(i64, String)> = bounded(
        sqlx::query_as("SELECT id, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool),
    )
    .await?;
    // Unknown emails fail the same way as wrong passwords.
    let Some((id, hashed)) = row else {
        return Err(AppError::IncorrectPassword);
    };

    if !crate::password::verify(password, &hashed)? {
        return Err(AppError::IncorrectPassword);
    }
    Ok(id)
}

pub async fn update_password_for_user(pool: &DbPool, id: i64, hash: &str) -> AppResult<()> {
    let result = bounded(
        sqlx::query("UPDATE users SET password = $1, updated_at = now() WHERE id = $2")
            .bind(hash)
            .bind(id)
            .execute(pool),
    )
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn get_all_users(orm: &OrmConn) -> AppResult<Vec<User>> {
    let users = bounded(
        Users::find()
            .order_by_asc(UserCol::LastName)
            .order_by_asc(UserCol::FirstName)
            .all(orm),
    )
    .await?;
    Ok(users.into_iter().map(user_from_entity).collect())
}

pub async fn get_one_user(orm: &OrmConn, id: i64) -> AppResult<User> {
    let user = bounded(Users::find_by_id(id).one(orm)).await?;
    match user {
        Some(u) => Ok(user_from_entity(u)),
        None => Err(AppError::NotFound),
    }
}

pub async fn edit_user(orm: &OrmConn, id: i64, details: UserDetails) -> AppResult<User> {
    let existing = bounded(Users::find_by_id(id).one(orm)).await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let mut active: UserActive = existing.into();
    active.first_name = Set(details.first_name);
    active.last_name = Set(details.last_name);
    active.email = Set(details.email.to_lowercase());
    active.updated_at = Set(Utc::now().into());
    let user = bounded(active.update(orm)).await?;
    Ok(user_from_entity(user))
}

/// Insert a user with an already hashed password.
pub async fn add_user(orm: &OrmConn, details: UserDetails, hash: String) -> AppResult<User> {
    let now = Utc::now();
    let user = bounded(
        UserActive {
            id: NotSet,
            first_name: Set(details.first_name),
            last_name: Set(details.last_name),
            email: Set(details.email.to_lowercase()),
            password: Set(hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm),
    )
    .await?;
    Ok(user_from_entity(user))
}

/// Remove a user and every token issued to it.
pub async fn delete_user(pool: &DbPool, id: i64) -> AppResult<()> {
    bounded(async {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        tx.commit().await?;
        Ok::<_, sqlx::Error>(())
    })
    .await
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        password: row.password,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        password: model.password,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
