//! API route handlers

pub mod admin;
pub mod health;
pub mod token;

use axum::{http::StatusCode, routing::get, Json, Router};
use fx1_core::{Address, Amount};

use crate::dto::{parse_amount_field, ApiError};
use crate::state::ServiceError;
use crate::AppState;

/// Error half of every handler result
pub type ErrorResponse = (StatusCode, Json<ApiError>);

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/token", token::router())
        .nest("/admin", admin::router())
        .with_state(state)
}

pub(crate) fn service_error(e: ServiceError) -> ErrorResponse {
    (
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(e.error_code(), e.to_string())),
    )
}

pub(crate) fn parse_address(field: &str, value: &str) -> Result<Address, ErrorResponse> {
    value.parse().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request(format!("Invalid {}: {}", field, e))),
        )
    })
}

pub(crate) fn parse_amount(field: &str, value: &str) -> Result<Amount, ErrorResponse> {
    parse_amount_field(field, value).map_err(|e| (StatusCode::BAD_REQUEST, Json(e)))
}
