use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{
    db::{DbPool, OrmConn},
    dto::auth::{AuthenticateRequest, LoginForm, TokenResponse},
    error::{AppError, AppResult},
    models::User,
    repository::{tokens, tokens::NewToken, users},
    session,
};
use tower_sessions::Session;

const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Rotate the session token, check the credentials and remember the user.
/// The token is rotated even when the password is wrong.
pub async fn login(pool: &DbPool, session: &Session, form: LoginForm) -> AppResult<i64> {
    session::renew_token(session).await?;

    let user_id = users::authenticate(pool, &form.email, &form.password).await?;
    session::set_user_id(session, user_id).await?;
    tracing::info!(user_id, "user logged in");
    Ok(user_id)
}

/// Forget the user and discard the session id.
pub async fn logout(session: &Session) -> AppResult<()> {
    if let Some(user_id) = session::user_id(session).await? {
        tracing::info!(user_id, "user logged out");
    }
    session::destroy(session).await
}

/// Exchange credentials for a bearer token valid for 24 hours.
pub async fn issue_token(
    pool: &DbPool,
    orm: &OrmConn,
    payload: AuthenticateRequest,
) -> AppResult<TokenResponse> {
    let user = match users::get_user_by_email(pool, &payload.email).await {
        Ok(user) => user,
        Err(AppError::NotFound) => return Err(AppError::Unauthorized),
        Err(err) => return Err(err),
    };
    if !crate::password::verify(&payload.password, &user.password)? {
        return Err(AppError::IncorrectPassword);
    }

    let mut raw = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut raw);
    let plaintext = URL_SAFE_NO_PAD.encode(raw);
    let expiry = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS);

    tokens::insert_token(
        orm,
        NewToken {
            user_id: user.id,
            name: format!("{} {}", user.first_name, user.last_name),
            email: user.email.clone(),
            token_hash: hash_token(&plaintext),
            expiry,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "issued api token");
    Ok(TokenResponse {
        token: plaintext,
        expiry,
    })
}

/// Only this digest is stored; the plaintext goes to the client once.
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

pub async fn user_for_bearer(pool: &DbPool, plaintext: &str) -> AppResult<User> {
    tokens::get_user_for_token(pool, &hash_token(plaintext))
        .await?
        .ok_or(AppError::Unauthorized)
}
