//! HTTP surface: JSON endpoints for issuing and checking license keys.

pub mod error;
pub mod routes;

use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, SecondsFormat, Utc};
use tower_http::trace::TraceLayer;

use crate::service::LicenseService;

pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: LicenseService,
}

impl AppState {
    pub const fn new(service: LicenseService) -> Self {
        Self { service }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::liveness))
        .route("/ping", get(routes::liveness))
        .route("/generate", post(routes::generate))
        .route("/verify", post(routes::verify))
        .route("/api/validate", post(routes::validate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// RFC 3339 UTC timestamp with second precision, e.g. `2025-01-31T12:00:00Z`.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
