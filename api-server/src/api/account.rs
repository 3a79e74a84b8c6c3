//! Account API handlers
//!
//! Handles endpoints related to accounts:
//! - Create, fetch and delete an account
//! - Transfer funds between two accounts

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use common::model::account::{Account, NewAccount};
use common::model::transfer::TransferRequest;

use crate::api::response::{ApiResponse, TransferResponse};
use crate::error::ApiError;
use crate::AppState;

/// Create a new account
#[utoipa::path(
    post,
    path = "/account",
    request_body = NewAccount,
    responses(
        (status = 201, description = "Account successfully created", body = Account),
        (status = 400, description = "Invalid account data", body = crate::error::ErrorResponse),
        (status = 409, description = "Account number already exists", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    ),
    tag = "account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> Result<ApiResponse<Account>, ApiError> {
    let Json(request) = payload?;
    let account = state.account_service.create_account(request).await?;

    Ok(ApiResponse::created(account))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/account/{id}",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account details retrieved successfully", body = Account),
        (status = 400, description = "Malformed account ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    ),
    tag = "account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<ApiResponse<Account>, ApiError> {
    let Path(id) = id?;
    let account = state
        .account_service
        .get_account(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", id)))?;

    Ok(ApiResponse::ok(account))
}

/// Delete an account by ID
#[utoipa::path(
    delete,
    path = "/account/{id}",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account deleted", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed account ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    ),
    tag = "account"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<&'static str, ApiError> {
    let Path(id) = id?;
    state.account_service.delete_account(id).await?;

    Ok("Account deleted successfully")
}

/// Move funds from one account to another
#[utoipa::path(
    post,
    path = "/account/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer completed", body = TransferResponse),
        (status = 400, description = "Rejected transfer or malformed body", body = crate::error::ErrorResponse),
        (status = 404, description = "Source or destination account not found", body = crate::error::ErrorResponse),
        (status = 503, description = "Storage deadline exceeded", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    ),
    tag = "account"
)]
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<ApiResponse<TransferResponse>, ApiError> {
    let Json(request) = payload?;
    let receipt = state.account_service.transfer(&request).await?;

    Ok(ApiResponse::ok(receipt.into()))
}
