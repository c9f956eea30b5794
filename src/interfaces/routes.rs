use actix_web::web;

use crate::handlers::{home::home, system::health_check};

mod auth;
mod json_error;
mod sightings;
mod uploads;

pub fn configure_routes(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.configure(auth::config_routes);
    cfg.configure(|cfg| sightings::config_routes(cfg, max_upload_bytes));
    cfg.configure(uploads::config_routes);

    cfg.configure(json_error::config_routes);
}
