use uuid::Uuid;

use crate::{
    entities::sighting::{Sighting, SightingInsert, UploadRequest},
    errors::AppError,
    repositories::sighting::SightingRepository,
    storage::ImageStorage,
    use_cases::upload_policy::UploadPolicy,
};

pub struct SightingHandler<R, S>
where
    R: SightingRepository,
    S: ImageStorage,
{
    pub sighting_repo: R,
    pub storage: S,
    pub policy: UploadPolicy,
}

impl<R, S> SightingHandler<R, S>
where
    R: SightingRepository,
    S: ImageStorage,
{
    pub fn new(sighting_repo: R, storage: S, policy: UploadPolicy) -> Self {
        SightingHandler {
            sighting_repo,
            storage,
            policy,
        }
    }

    /// Validates an upload, stores the image, then writes the record.
    ///
    /// File storage and the record write are independent. When the record
    /// write fails the stored image is removed on a best-effort basis and the
    /// caller still sees `PersistenceError`.
    pub async fn upload(&self, owner_id: Uuid, request: UploadRequest) -> Result<Sighting, AppError> {
        let validated = request.validate()?;
        let kind = self.policy.check_declared(&validated.file)?;

        let bytes = tokio::fs::read(&validated.file.path)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to read uploaded file: {}", e)))?;
        self.policy.check_content(kind, &bytes)?;

        let key = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let stored = self.storage
            .put(&key, bytes, kind.mime_type())
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        let insert = SightingInsert {
            user_id: owner_id,
            image_url: stored.url,
            storage_key: stored.key,
            animal_name: validated.animal_name,
            observed_at: validated.observed_at,
            location: validated.location,
        };

        match self.sighting_repo.create_sighting(&insert).await {
            Ok(sighting) => {
                tracing::info!(sighting_id = %sighting.id, owner_id = %owner_id, "Sighting uploaded");
                Ok(sighting)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&insert.storage_key).await {
                    tracing::warn!(
                        storage_key = %insert.storage_key,
                        "Failed to remove orphaned image after record write failure: {}",
                        cleanup
                    );
                }
                Err(match e {
                    AppError::PersistenceError(msg) => AppError::PersistenceError(msg),
                    other => AppError::PersistenceError(other.to_string()),
                })
            }
        }
    }

    /// Lists the caller's own sightings
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Sighting>, AppError> {
        self.sighting_repo.list_by_owner(&owner_id).await
    }

    /// Deletes a sighting owned by the caller; the stored image is kept.
    pub async fn delete(&self, id: &str, owner_id: Uuid) -> Result<(), AppError> {
        let id = Uuid::parse_str(id)
            .map_err(|_| AppError::NotFound("Sighting not found".to_string()))?;

        self.sighting_repo.delete_by_id(&id, &owner_id).await?;
        tracing::info!(sighting_id = %id, owner_id = %owner_id, "Sighting deleted");
        Ok(())
    }
}
