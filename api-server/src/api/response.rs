//! Response bodies shared by the handlers

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use common::decimal::Amount;
use common::model::transfer::TransferReceipt;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

/// A JSON body paired with the status it is sent with
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T> ApiResponse<T> {
    /// 200 OK
    pub fn ok(data: T) -> Self {
        Self { status: StatusCode::OK, data }
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self { status: StatusCode::CREATED, data }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        (self.status, Json(self.data)).into_response()
    }
}

/// Confirmation of an accepted transfer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    pub message: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    /// Source balance after the transfer
    #[schema(value_type = String, example = "60.00")]
    pub from_balance: Amount,
    /// Destination balance after the transfer
    #[schema(value_type = String, example = "90.00")]
    pub to_balance: Amount,
    /// When the transfer was accepted
    pub transferred_at: DateTime<Utc>,
}

impl From<TransferReceipt> for TransferResponse {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            message: "Transfer completed successfully".to_string(),
            from_account_id: receipt.from_account_id,
            to_account_id: receipt.to_account_id,
            from_balance: receipt.from_balance,
            to_balance: receipt.to_balance,
            transferred_at: receipt.transferred_at,
        }
    }
}

/// Service liveness
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
