//! Login handler

use std::sync::Arc;

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token issued on successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Exchange a username and password for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;

    Ok(ApiResponse::ok(LoginResponse { token }))
}
