//! Spreadsheet upload handler

use axum::{
    extract::{Multipart, State},
    response::Json,
};

use crate::error::{AppError, AppResult};
use crate::import::ImportOutcome;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Multipart field carrying the workbook
const FILE_FIELD: &str = "file";

/// POST /api/users/upload
pub async fn upload_users(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportOutcome>>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read upload {}: {}", file_name, e);
            AppError::PayloadTooLarge(e.body_text())
        })?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AppError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD)));
    };

    let outcome = state
        .importer
        .import_file(&file_name, bytes, &state.store())
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}
