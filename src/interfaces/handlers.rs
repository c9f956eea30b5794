pub mod auth;
pub mod home;
pub mod json_error;
pub mod sightings;
pub mod system;
pub mod uploads;
