//! Serves objects from the local media store.

use actix_web::{HttpResponse, http::header, web};

use agora_core::domain::MediaKind;
use agora_core::ports::MediaError;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /media/{file}
pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let public_id = path.into_inner();

    let file = state
        .media_files
        .read(&public_id)
        .await
        .map_err(|e| match e {
            MediaError::NotFound(_) => AppError::NotFound(format!("Media {} not found", public_id)),
            other => AppError::Internal(other.to_string()),
        })?;

    let mut response = HttpResponse::Ok();
    response
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((
            header::CONTENT_SECURITY_POLICY,
            "default-src 'none'; sandbox",
        ));

    // Anything that is not plain image or video media is only offered as a download.
    if MediaKind::classify(&file.content_type).is_none() {
        response.insert_header((header::CONTENT_DISPOSITION, "attachment"));
    }

    Ok(response.content_type(file.content_type).body(file.bytes))
}
