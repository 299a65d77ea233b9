use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::cv::CvData;
use crate::errors::AppError;
use crate::import::{import_pdf, ImportError};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/import/pdf
pub async fn handle_import_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CvData>, AppError> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            upload = Some(field.bytes().await?);
            break;
        }
    }

    let bytes = upload.ok_or(ImportError::MissingFile)?;
    let limit = state.config.max_upload_bytes;
    if bytes.len() > limit {
        return Err(ImportError::TooLarge { limit }.into());
    }

    let size = bytes.len();
    // Extraction is CPU-bound; a panic inside the PDF parser surfaces as a JoinError.
    let cv = tokio::task::spawn_blocking(move || import_pdf(&bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                AppError::Import(ImportError::Extraction("PDF parser crashed".to_string()))
            } else {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF import: {e}"))
            }
        })??;

    info!(
        "Imported PDF ({size} bytes): {} experiences, {} education, {} skills",
        cv.experiences.len(),
        cv.education.len(),
        cv.skills.len()
    );
    Ok(Json(cv))
}
