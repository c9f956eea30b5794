use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::errors::AppError;
use crate::handlers::sightings;

/// Room for the text parts and multipart framing on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn config_routes(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    // `/animal-images` is kept as an alias of `/data`.
    for prefix in ["/data", "/animal-images"] {
        cfg.service(
            web::scope(prefix)
                .app_data(multipart_config(max_upload_bytes))
                .service(sightings::upload_sighting)
                .service(sightings::list_sightings)
                .service(sightings::delete_sighting)
        );
    }
}

fn multipart_config(max_upload_bytes: usize) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(max_upload_bytes + FORM_OVERHEAD_BYTES)
        .memory_limit(FORM_OVERHEAD_BYTES)
        .error_handler(|err, _req| AppError::from(err).into())
}
