use std::time::Duration;

use axum::{
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod clients;
pub mod dashboard;
pub mod deals;
pub mod error;
pub mod middleware;
pub mod quotes;
pub mod referrals;
pub mod state;
pub mod tickets;

pub use state::{AppState, AuthConfig, Repositories};

/// Builds the full router. Everything under `/v1` requires a staff token.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let staff = Router::new()
        .merge(clients::routes())
        .merge(quotes::routes())
        .merge(deals::routes())
        .merge(tickets::routes())
        .merge(referrals::routes())
        .merge(dashboard::routes())
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::staff_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(staff)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
