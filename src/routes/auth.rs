use axum::{
    Form, Json, Router,
    extract::{OriginalUri, Query, State},
    response::Redirect,
    routing::{get, post},
};

use crate::{
    dto::auth::{
        AuthenticateRequest, ForgotPasswordRequest, LoginForm, ResetPasswordQuery,
        ResetPasswordRequest, ResetPasswordView, TokenResponse,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::{auth_service, password_service},
    state::AppState,
};
use tower_sessions::Session;

/// Session login, logout and the reset-link landing page.
pub fn web_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/reset-password", get(show_reset_password))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to / on success, back to /login otherwise")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Redirect> {
    let target = match auth_service::login(&state.pool, &session, form).await {
        Ok(_) => "/",
        Err(err @ AppError::IncorrectPassword) => {
            tracing::warn!(error = %err, "login failed");
            "/login"
        }
        Err(err) => return Err(err),
    };
    Ok(Redirect::to(target))
}

#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Session cleared, redirect to /login")),
    tag = "Auth"
)]
pub async fn logout(session: Session) -> AppResult<Redirect> {
    auth_service::logout(&session).await?;
    Ok(Redirect::to("/login"))
}

#[utoipa::path(
    get,
    path = "/reset-password",
    params(
        ("email" = String, Query, description = "Account email"),
        ("ts" = i64, Query, description = "Issue time, unix seconds"),
        ("sig" = String, Query, description = "HMAC-SHA256 signature")
    ),
    responses(
        (status = 200, description = "Reset form model with the encrypted email", body = ApiResponse<ResetPasswordView>),
        (status = 403, description = "Tampered or expired link")
    ),
    tag = "Auth"
)]
pub async fn show_reset_password(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ResetPasswordQuery>,
) -> AppResult<Json<ApiResponse<ResetPasswordView>>> {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    let full_url = format!("{}{path}", state.config.front_end);

    let view = password_service::reset_form(&state.signer, &state.encryptor, &full_url, &query.email)?;
    Ok(Json(ApiResponse::success("Reset password", view, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/authenticate",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Bearer token valid for 24 hours", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(payload): Json<AuthenticateRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let token = auth_service::issue_token(&state.pool, &state.orm, payload).await?;
    Ok(Json(ApiResponse::success("Authenticated", token, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent"),
        (status = 400, description = "No matching email found")
    ),
    tag = "Auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    password_service::forgot_password(
        &state.pool,
        state.mailer.as_ref(),
        &state.signer,
        &state.config.front_end,
        payload,
    )
    .await?;
    Ok(Json(ApiResponse::success(
        "Reset link sent",
        serde_json::json!({ "error": false }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid encrypted email or password")
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    password_service::reset_password(&state.pool, &state.encryptor, payload).await?;
    Ok(Json(ApiResponse::success(
        "Password changed",
        serde_json::json!({ "error": false }),
        Some(Meta::empty()),
    )))
}
