use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("Invalid URL - tampering detected")]
    InvalidSignature,

    #[error("Link expired")]
    LinkExpired,

    #[error("Database timeout")]
    Timeout,

    #[error("Database error")]
    DbError(sqlx::Error),

    #[error("ORM error")]
    OrmError(sea_orm::DbErr),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Session error")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Upstream request failed")]
    Upstream(#[from] reqwest::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::DbError(other),
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(_) => AppError::NotFound,
            other => AppError::OrmError(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            AppError::InvalidSignature | AppError::LinkExpired => StatusCode::FORBIDDEN,
            AppError::PaymentGateway(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Session(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_and_gateway_errors_are_server_side() {
        assert_eq!(AppError::Timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::PaymentGateway("declined".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::BadRequest("amount".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
