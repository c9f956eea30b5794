use actix_web::web;

use crate::handlers::uploads;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/uploads").service(uploads::serve_upload));
}
