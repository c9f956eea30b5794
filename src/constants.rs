use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

/// Process start, forced in `main` so `/health` reports real uptime.
pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);
