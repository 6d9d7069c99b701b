mod v1;

use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/v1", v1::routes())
}

/// Routes served outside `/api`: public share links and liveness.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/s/{token}", get(handlers::share::fetch_shared))
        .route("/s/{token}/raw", get(handlers::share::fetch_shared_raw))
        .route("/s/{token}/download", get(handlers::share::download_shared))
        .route("/healthz", get(handlers::health::healthz))
}
