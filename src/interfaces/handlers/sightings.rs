use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, web, HttpResponse, Responder, ResponseError};
use tracing::instrument;

use crate::entities::sighting::{SightingCreatedResponse, SightingUpload, UploadRequest};
use crate::use_cases::extractors::AuthClaims;
use crate::AppState;

#[post("/upload")]
#[instrument(skip_all, fields(user_id = %claims.0.sub))]
pub async fn upload_sighting(
    state: web::Data<AppState>,
    claims: AuthClaims,
    form: MultipartForm<SightingUpload>,
) -> impl Responder {
    let owner_id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    // The temp file lives as long as `form`, which outlives the pipeline run.
    let request = UploadRequest::from(&*form);

    match state.sighting_handler.upload(owner_id, request).await {
        Ok(sighting) => HttpResponse::Created().json(SightingCreatedResponse {
            message: "Image and location data uploaded successfully".to_string(),
            animal_image: sighting,
        }),
        Err(e) => e.to_http_response(),
    }
}

#[get("")]
#[instrument(skip_all, fields(user_id = %claims.0.sub))]
pub async fn list_sightings(
    state: web::Data<AppState>,
    claims: AuthClaims,
) -> impl Responder {
    let owner_id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    match state.sighting_handler.list(owner_id).await {
        Ok(sightings) => HttpResponse::Ok().json(sightings),
        Err(e) => e.to_http_response(),
    }
}

#[delete("/delete/{id}")]
#[instrument(skip_all, fields(user_id = %claims.0.sub, sighting_id = %path))]
pub async fn delete_sighting(
    state: web::Data<AppState>,
    claims: AuthClaims,
    path: web::Path<String>,
) -> impl Responder {
    let owner_id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => return e.error_response(),
    };

    match state.sighting_handler.delete(&path, owner_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Image deleted successfully"
        })),
        Err(e) => e.to_http_response(),
    }
}
