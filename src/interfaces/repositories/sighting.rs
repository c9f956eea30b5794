use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::sighting::{Sighting, SightingInsert, SightingRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxSightingRepo,
};

const SIGHTING_COLUMNS: &str =
    "id, user_id, image_url, storage_key, animal_name, observed_at, latitude, longitude, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SightingRepository: Send + Sync {
    /// Persists a new sighting and returns it as stored
    async fn create_sighting(&self, sighting: &SightingInsert) -> Result<Sighting, AppError>;

    /// All sightings owned by `owner_id`, in natural store order
    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Sighting>, AppError>;

    /// Deletes the sighting when `owner_id` owns it.
    ///
    /// `NotFound` when no such record exists, `Forbidden` when it belongs to
    /// another user (the record is left untouched).
    async fn delete_by_id(&self, id: &Uuid, owner_id: &Uuid) -> Result<(), AppError>;
}

#[async_trait]
impl<T: SightingRepository + ?Sized> SightingRepository for Arc<T> {
    async fn create_sighting(&self, sighting: &SightingInsert) -> Result<Sighting, AppError> {
        (**self).create_sighting(sighting).await
    }

    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Sighting>, AppError> {
        (**self).list_by_owner(owner_id).await
    }

    async fn delete_by_id(&self, id: &Uuid, owner_id: &Uuid) -> Result<(), AppError> {
        (**self).delete_by_id(id, owner_id).await
    }
}

impl SqlxSightingRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxSightingRepo { pool }
    }
}

#[async_trait]
impl SightingRepository for SqlxSightingRepo {
    async fn create_sighting(&self, sighting: &SightingInsert) -> Result<Sighting, AppError> {
        let row = sqlx::query_as::<_, SightingRow>(&format!(
            r#"
            INSERT INTO sightings (
                user_id,
                image_url,
                storage_key,
                animal_name,
                observed_at,
                latitude,
                longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SIGHTING_COLUMNS}
            "#
        ))
        .bind(sighting.user_id)
        .bind(&sighting.image_url)
        .bind(&sighting.storage_key)
        .bind(&sighting.animal_name)
        .bind(sighting.observed_at)
        .bind(sighting.location.latitude)
        .bind(sighting.location.longitude)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Sighting>, AppError> {
        let rows = sqlx::query_as::<_, SightingRow>(&format!(
            "SELECT {SIGHTING_COLUMNS} FROM sightings WHERE user_id = $1"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Sighting::from).collect())
    }

    async fn delete_by_id(&self, id: &Uuid, owner_id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM sightings WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM sightings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            Some(_) => Err(AppError::Forbidden("You can only delete your own sightings".to_string())),
            None => Err(AppError::NotFound("Sighting not found".to_string())),
        }
    }
}
