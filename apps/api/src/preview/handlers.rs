use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::cv::context_from_json;
use crate::errors::AppError;
use crate::preview::{compose, PreviewRequest, PreviewResponse};
use crate::render::RenderContext;
use crate::state::AppState;
use crate::templates::TemplateAsset;

#[derive(Deserialize)]
pub struct ContextRequest {
    #[serde(default)]
    pub cv: serde_json::Value,
}

/// POST /api/v1/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    if !req.has_template() {
        return Err(AppError::Validation(
            "Either template_id or template_html is required".to_string(),
        ));
    }
    Ok(Json(compose(state.templates.as_ref(), req).await))
}

/// POST /api/v1/preview/context
pub async fn handle_preview_context(
    Json(req): Json<ContextRequest>,
) -> Result<Json<RenderContext>, AppError> {
    Ok(Json(context_from_json(req.cv)?))
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TemplateAsset>, AppError> {
    Ok(Json(state.templates.fetch(&id).await?))
}
