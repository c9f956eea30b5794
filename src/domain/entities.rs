pub mod sighting;
pub mod token;
pub mod user;
