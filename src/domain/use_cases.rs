pub mod auth;
pub mod extractors;
pub mod sightings;
pub mod upload_policy;
