use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, storage, web};

use auth::jwt::JwtService;
use repositories::{
    sighting::SightingRepository,
    sqlx_repo::{SqlxSightingRepo, SqlxUserRepo},
    user::UserRepository,
};
use settings::AppConfig;
use storage::ImageStorage;
use use_cases::{auth::AuthHandler, sightings::SightingHandler, upload_policy::UploadPolicy};

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub sighting_handler: AppSightingHandler,
}

pub type AppAuthHandler = AuthHandler<Arc<dyn UserRepository>, JwtService>;
pub type AppSightingHandler = SightingHandler<Arc<dyn SightingRepository>, Arc<dyn ImageStorage>>;

impl AppState {
    /// Wires the Postgres-backed stores.
    pub fn new(config: &AppConfig, pool: sqlx::PgPool, storage: Arc<dyn ImageStorage>) -> Self {
        Self::with_stores(
            config,
            Arc::new(SqlxUserRepo::new(pool.clone())),
            Arc::new(SqlxSightingRepo::new(pool)),
            storage,
        )
    }

    pub fn with_stores(
        config: &AppConfig,
        user_repo: Arc<dyn UserRepository>,
        sighting_repo: Arc<dyn SightingRepository>,
        storage: Arc<dyn ImageStorage>,
    ) -> Self {
        AppState {
            auth_handler: AuthHandler::new(user_repo, JwtService::new(config)),
            sighting_handler: SightingHandler::new(
                sighting_repo,
                storage,
                UploadPolicy::new(config.max_upload_bytes),
            ),
        }
    }
}
