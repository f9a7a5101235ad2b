use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    dto::checkout::{CheckoutForm, Receipt, WidgetView},
    error::AppResult,
    repository::widgets,
    response::{ApiResponse, Meta},
    services::checkout_service,
    session,
    state::AppState,
};
use tower_sessions::Session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/widget/{id}", get(charge_once))
        .route("/payment-succeeded", post(payment_succeeded))
        .route(
            "/virtual-terminal-payment-succeeded",
            post(virtual_terminal_payment_succeeded),
        )
        .route("/receipt", get(receipt))
        .route("/virtual-terminal-receipt", get(virtual_terminal_receipt))
}

#[utoipa::path(
    get,
    path = "/widget/{id}",
    params(("id" = i64, Path, description = "Widget ID")),
    responses(
        (status = 200, description = "Buy-once page model", body = ApiResponse<WidgetView>),
        (status = 404, description = "Not Found")
    ),
    tag = "Checkout"
)]
pub async fn charge_once(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<WidgetView>>> {
    let widget = widgets::get_widget(&state.pool, id).await?;
    let data = WidgetView {
        widget,
        stripe_key: state.config.stripe.key.clone(),
    };
    Ok(Json(ApiResponse::success("Widget", data, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/payment-succeeded",
    request_body(content = CheckoutForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Order recorded, redirect to /receipt"),
        (status = 400, description = "Invalid form"),
        (status = 502, description = "Payment gateway error")
    ),
    tag = "Checkout"
)]
pub async fn payment_succeeded(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> AppResult<Redirect> {
    let outcome = checkout_service::complete_purchase(
        &state.pool,
        state.payments.as_ref(),
        &state.invoices,
        form,
    )
    .await?;

    session::put_receipt(&session, outcome.receipt).await?;
    Ok(Redirect::to("/receipt"))
}

#[utoipa::path(
    post,
    path = "/virtual-terminal-payment-succeeded",
    request_body(content = CheckoutForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Charge recorded, redirect to /virtual-terminal-receipt"),
        (status = 400, description = "Invalid form")
    ),
    tag = "Checkout"
)]
pub async fn virtual_terminal_payment_succeeded(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> AppResult<Redirect> {
    let receipt =
        checkout_service::complete_terminal_payment(&state.pool, state.payments.as_ref(), form)
            .await?;

    session::put_receipt(&session, receipt).await?;
    Ok(Redirect::to("/virtual-terminal-receipt"))
}

async fn show_receipt(session: Session) -> AppResult<Response> {
    let Some(receipt) = session::take_receipt(&session).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    let body = ApiResponse::success("Receipt", receipt, Some(Meta::empty()));
    Ok(Json(body).into_response())
}

#[utoipa::path(
    get,
    path = "/receipt",
    responses(
        (status = 200, description = "Receipt, removed from the session once read", body = ApiResponse<Receipt>),
        (status = 303, description = "No receipt in session")
    ),
    tag = "Checkout"
)]
pub async fn receipt(session: Session) -> AppResult<Response> {
    show_receipt(session).await
}

#[utoipa::path(
    get,
    path = "/virtual-terminal-receipt",
    responses(
        (status = 200, description = "Terminal receipt, removed from the session once read", body = ApiResponse<Receipt>),
        (status = 303, description = "No receipt in session")
    ),
    tag = "Checkout"
)]
pub async fn virtual_terminal_receipt(session: Session) -> AppResult<Response> {
    show_receipt(session).await
}
