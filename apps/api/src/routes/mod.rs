pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::import::handlers as import;
use crate::preview::handlers as preview;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Preview API
        .route("/api/v1/preview", post(preview::handle_preview))
        .route(
            "/api/v1/preview/context",
            post(preview::handle_preview_context),
        )
        .route("/api/v1/templates/:id", get(preview::handle_get_template))
        // Import API
        .route(
            "/api/v1/import/pdf",
            post(import::handle_import_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .fallback(not_found)
        .with_state(state)
}
