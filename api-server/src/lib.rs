//! HTTP surface of the bank ledger: routing, handlers and error mapping

pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use account_service::AccountService;
use auth_service::AuthService;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{account, auth};

/// App state shared across handlers
pub struct AppState {
    /// Account store and transfers
    pub account_service: Arc<AccountService>,
    /// Login and token issuance
    pub auth_service: Arc<AuthService>,
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api::account::create_account,
        api::account::get_account,
        api::account::delete_account,
        api::account::transfer,
        api::auth::login,
        api::health,
    ),
    components(
        schemas(
            common::model::account::Account,
            common::model::account::NewAccount,
            common::model::transfer::TransferRequest,
            api::response::TransferResponse,
            api::response::HealthResponse,
            api::auth::LoginRequest,
            api::auth::LoginResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "account", description = "Account and transfer endpoints"),
        (name = "auth", description = "Login endpoint"),
        (name = "health", description = "Liveness endpoint")
    ),
    info(
        title = "Bank Ledger API",
        version = "1.0.0",
        description = "Account management and funds transfer API"
    )
)]
pub struct ApiDoc;

/// Build the application router with request tracing and CORS
pub fn router(state: Arc<AppState>, log_level: Level) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/account", post(account::create_account))
        .route("/account/transfer", post(account::transfer))
        .route(
            "/account/:id",
            get(account::get_account).delete(account::delete_account),
        )
        .route("/login", post(auth::login))
        .route("/health", get(api::health));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(api_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state)
}
