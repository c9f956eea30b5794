use std::path::PathBuf;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::MAX_TEXT_CHARS;
use crate::errors::{AppError, FieldError};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SightingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub storage_key: String,
    pub animal_name: String,
    pub observed_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SightingInsert {
    pub user_id: Uuid,
    pub image_url: String,
    pub storage_key: String,
    pub animal_name: String,
    pub observed_at: DateTime<Utc>,
    pub location: GeoPoint,
}

// ───── API Models ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    pub id: Uuid,
    pub image: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub storage_key: String,
    pub animal_name: String,
    pub time: DateTime<Utc>,
    pub location: GeoPoint,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<SightingRow> for Sighting {
    fn from(row: SightingRow) -> Self {
        Sighting {
            id: row.id,
            image: row.image_url,
            storage_key: row.storage_key,
            animal_name: row.animal_name,
            time: row.observed_at,
            location: GeoPoint {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            user: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SightingCreatedResponse {
    pub message: String,
    pub animal_image: Sighting,
}

// ───── Input & Validation ───────────────────────────────────────────

/// Multipart body of an upload. Every part is optional so that presence
/// can be reported per field instead of failing extraction.
#[derive(Debug, MultipartForm)]
#[multipart(duplicate_field = "deny")]
pub struct SightingUpload {
    #[multipart(rename = "image")]
    pub image: Option<TempFile>,

    #[multipart(rename = "animalName")]
    pub animal_name: Option<Text<String>>,

    pub time: Option<Text<String>>,

    pub latitude: Option<Text<String>>,

    pub longitude: Option<Text<String>>,
}

/// A file part already spooled to disk by the multipart extractor.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub path: PathBuf,
}

/// Raw upload fields, decoupled from the multipart extractor.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub animal_name: Option<String>,
    pub time: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub file: Option<IncomingFile>,
}

impl From<&SightingUpload> for UploadRequest {
    fn from(form: &SightingUpload) -> Self {
        UploadRequest {
            animal_name: form.animal_name.as_ref().map(|t| t.0.clone()),
            time: form.time.as_ref().map(|t| t.0.clone()),
            latitude: form.latitude.as_ref().map(|t| t.0.clone()),
            longitude: form.longitude.as_ref().map(|t| t.0.clone()),
            file: form.image.as_ref().map(|f| IncomingFile {
                file_name: f.file_name.clone(),
                content_type: f.content_type.as_ref().map(|m| m.essence_str().to_string()),
                size: f.size,
                path: f.file.path().to_path_buf(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub animal_name: String,
    pub observed_at: DateTime<Utc>,
    pub location: GeoPoint,
    pub file: IncomingFile,
}

impl UploadRequest {
    /// Checks presence of every field, then parses coordinates and time.
    pub fn validate(self) -> Result<ValidatedUpload, AppError> {
        let mut missing = Vec::new();

        let animal_name = required(self.animal_name, "animalName", &mut missing);
        let time = required(self.time, "time", &mut missing);
        let latitude = required(self.latitude, "latitude", &mut missing);
        let longitude = required(self.longitude, "longitude", &mut missing);
        if self.file.is_none() {
            missing.push(FieldError::new("image", "Image file is required"));
        }

        let (Some(animal_name), Some(time), Some(latitude), Some(longitude), Some(file)) =
            (animal_name, time, latitude, longitude, self.file)
        else {
            return Err(AppError::ValidationError(missing));
        };

        let mut invalid = Vec::new();
        if animal_name.chars().count() > MAX_TEXT_CHARS {
            invalid.push(FieldError::new(
                "animalName",
                format!("animalName must be at most {MAX_TEXT_CHARS} characters"),
            ));
        }
        let latitude = parse_coordinate(&latitude, "latitude", 90.0)
            .map_err(|e| invalid.push(e))
            .ok();
        let longitude = parse_coordinate(&longitude, "longitude", 180.0)
            .map_err(|e| invalid.push(e))
            .ok();
        let observed_at = parse_observed_at(&time)
            .map_err(|e| invalid.push(e))
            .ok();

        match (latitude, longitude, observed_at) {
            (Some(latitude), Some(longitude), Some(observed_at)) if invalid.is_empty() => Ok(ValidatedUpload {
                animal_name,
                observed_at,
                location: GeoPoint { latitude, longitude },
                file,
            }),
            _ => Err(AppError::ValidationError(invalid)),
        }
    }
}

fn required(value: Option<String>, field: &str, missing: &mut Vec<FieldError>) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            missing.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

/// Parses a coordinate strictly: finite and within `±bound` degrees.
pub fn parse_coordinate(raw: &str, field: &str, bound: f64) -> Result<f64, FieldError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FieldError::new(field, format!("{field} must be a valid number")))?;

    if !value.is_finite() {
        return Err(FieldError::new(field, format!("{field} must be a valid number")));
    }
    if value.abs() > bound {
        return Err(FieldError::new(
            field,
            format!("{field} must be between -{bound} and {bound}"),
        ));
    }
    Ok(value)
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Accepts RFC 3339, a zoneless date-time (taken as UTC) or a bare date.
pub fn parse_observed_at(raw: &str) -> Result<DateTime<Utc>, FieldError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(FieldError::new("time", "time must be a valid date or date-time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn incoming_file() -> IncomingFile {
        IncomingFile {
            file_name: Some("deer.jpg".into()),
            content_type: Some("image/jpeg".into()),
            size: 4,
            path: PathBuf::from("/tmp/deer.jpg"),
        }
    }

    fn complete_request() -> UploadRequest {
        UploadRequest {
            animal_name: Some("Deer".into()),
            time: Some("2024-01-01T10:00".into()),
            latitude: Some("12.34".into()),
            longitude: Some("56.78".into()),
            file: Some(incoming_file()),
        }
    }

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::ValidationError(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn complete_request_parses_exact_coordinates() {
        let validated = complete_request().validate().unwrap();

        assert_eq!(validated.animal_name, "Deer");
        assert_eq!(validated.location.latitude, 12.34);
        assert_eq!(validated.location.longitude, 56.78);
        assert_eq!(validated.observed_at, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn every_missing_field_is_listed() {
        let err = UploadRequest::default().validate().unwrap_err();

        assert_eq!(fields(err), vec!["animalName", "time", "latitude", "longitude", "image"]);
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let mut request = complete_request();
        request.animal_name = Some("   ".into());

        assert_eq!(fields(request.validate().unwrap_err()), vec!["animalName"]);
    }

    #[test]
    fn overlong_animal_name_is_rejected() {
        let mut request = complete_request();
        request.animal_name = Some("x".repeat(MAX_TEXT_CHARS + 1));

        assert_eq!(fields(request.validate().unwrap_err()), vec!["animalName"]);
    }

    #[test]
    fn missing_file_alone_is_rejected() {
        let mut request = complete_request();
        request.file = None;

        assert_eq!(fields(request.validate().unwrap_err()), vec!["image"]);
    }

    #[test]
    fn non_numeric_latitude_is_rejected() {
        let mut request = complete_request();
        request.latitude = Some("abc".into());

        assert_eq!(fields(request.validate().unwrap_err()), vec!["latitude"]);
    }

    #[test]
    fn trailing_garbage_is_not_a_number() {
        assert!(parse_coordinate("12.34abc", "latitude", 90.0).is_err());
    }

    #[test]
    fn non_finite_and_out_of_range_coordinates_are_rejected() {
        assert!(parse_coordinate("NaN", "latitude", 90.0).is_err());
        assert!(parse_coordinate("inf", "longitude", 180.0).is_err());
        assert!(parse_coordinate("90.5", "latitude", 90.0).is_err());
        assert!(parse_coordinate("-180.01", "longitude", 180.0).is_err());
        assert_eq!(parse_coordinate(" -90 ", "latitude", 90.0).unwrap(), -90.0);
    }

    #[test]
    fn observed_at_accepts_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_observed_at("2024-01-01T10:00").unwrap(), expected);
        assert_eq!(parse_observed_at("2024-01-01T10:00:00").unwrap(), expected);
        assert_eq!(parse_observed_at("2024-01-01T12:00:00+02:00").unwrap(), expected);
        assert_eq!(
            parse_observed_at("2024-01-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_observed_at("yesterday").is_err());
    }

    #[test]
    fn sighting_serializes_in_client_shape() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let sighting = Sighting::from(SightingRow {
            id,
            user_id: owner,
            image_url: "http://localhost:5000/uploads/x.jpg".into(),
            storage_key: "x.jpg".into(),
            animal_name: "Deer".into(),
            observed_at: now,
            latitude: 12.34,
            longitude: 56.78,
            created_at: now,
        });

        let json = serde_json::to_value(&sighting).unwrap();
        assert_eq!(json["animalName"], "Deer");
        assert_eq!(json["location"]["latitude"], 12.34);
        assert_eq!(json["user"], owner.to_string());
        assert!(json.get("storageKey").is_none());
    }
}
