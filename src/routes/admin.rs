use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::admin::{OrderActionRequest, OrderPageResponse, PageRequest, UserList, UserRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderType, User},
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all-sales", post(all_sales))
        .route("/all-subscriptions", post(all_subscriptions))
        .route("/get-sale/{id}", get(get_sale))
        .route("/get-subscription/{id}", get(get_subscription))
        .route("/refund", post(refund))
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/all-users", get(all_users))
        .route("/all-users/{id}", get(one_user))
        .route("/all-users/edit/{id}", post(edit_user))
        .route("/all-users/delete/{id}", post(delete_user))
}

#[utoipa::path(
    post,
    path = "/api/admin/all-sales",
    request_body = PageRequest,
    responses(
        (status = 200, description = "One page of one-time sales", body = ApiResponse<OrderPageResponse>),
        (status = 400, description = "page or page_size below 1"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn all_sales(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(page): Json<PageRequest>,
) -> AppResult<Json<ApiResponse<OrderPageResponse>>> {
    let resp = admin_service::list_orders(&state.pool, OrderType::Sale, page).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/all-subscriptions",
    request_body = PageRequest,
    responses(
        (status = 200, description = "One page of subscriptions", body = ApiResponse<OrderPageResponse>),
        (status = 400, description = "page or page_size below 1"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn all_subscriptions(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(page): Json<PageRequest>,
) -> AppResult<Json<ApiResponse<OrderPageResponse>>> {
    let resp = admin_service::list_orders(&state.pool, OrderType::Subscription, page).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/get-sale/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Sale with widget, transaction and customer", body = ApiResponse<Order>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::get_order(&state.pool, OrderType::Sale, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/get-subscription/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Subscription with widget, transaction and customer", body = ApiResponse<Order>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::get_order(&state.pool, OrderType::Subscription, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/refund",
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Order refunded", body = ApiResponse<Order>),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Payment gateway error")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn refund(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OrderActionRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::refund(
        &state.pool,
        &state.orm,
        state.payments.as_ref(),
        &user,
        payload.id,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/cancel-subscription",
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Subscription cancelled", body = ApiResponse<Order>),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Payment gateway error")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OrderActionRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::cancel_subscription(
        &state.pool,
        &state.orm,
        state.payments.as_ref(),
        &user,
        payload.id,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/all-users",
    responses((status = 200, description = "All admin users", body = ApiResponse<UserList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn all_users(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::all_users(&state.orm).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/all-users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "One user", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn one_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::one_user(&state.orm, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/all-users/edit/{id}",
    params(("id" = i64, Path, description = "User ID, 0 to add a user")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User saved", body = ApiResponse<User>),
        (status = 400, description = "Invalid user"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn edit_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::save_user(&state.pool, &state.orm, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/all-users/delete/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User and tokens deleted"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::delete_user(&state.pool, id).await?;
    Ok(Json(resp))
}
