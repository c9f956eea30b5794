use actix_web::{get, http::header, web, HttpResponse, Responder};
use std::path::Path;

use crate::errors::AppError;
use crate::storage::ImageStorage;
use crate::use_cases::upload_policy::ImageKind;
use crate::AppState;

/// Serves stored images by key. Keys are only ever `<uuid>.<ext>`.
#[get("/{key}")]
pub async fn serve_upload(
    state: web::Data<AppState>,
    key: web::Path<String>,
) -> impl Responder {
    let Some(kind) = parse_key(&key) else {
        return AppError::NotFound("Image not found".to_string()).to_http_response();
    };

    match state.sighting_handler.storage.get(&key).await {
        Ok(bytes) => HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, kind.mime_type()))
            .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
            .body(bytes),
        Err(e) => AppError::from(e).to_http_response(),
    }
}

fn parse_key(key: &str) -> Option<ImageKind> {
    let path = Path::new(key);
    let stem = path.file_stem()?.to_str()?;
    uuid::Uuid::parse_str(stem).ok()?;

    let ext = path.extension()?.to_str()?;
    let kind = ImageKind::from_extension(ext)?;
    (kind.extension() == ext).then_some(kind)
}
