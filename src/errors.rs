use std::fmt;

use actix_multipart::MultipartError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use jsonwebtoken::errors::{ErrorKind, Error as JwtError};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

use crate::storage::StorageError;

const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again";

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    BadRequest(String),
    NotFound(String),
    Forbidden(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    StorageError(String),
    PersistenceError(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Validation error: {}", messages)
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl AppError {
    /// Machine readable code returned in the `error` field of every body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::UnsupportedMediaType(_) => "unsupported_media_type",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::StorageError(_) => "storage_error",
            AppError::PersistenceError(_) => "persistence_error",
            AppError::InternalError(_) => "internal_server_error",
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": self.code(),
                    "message": "Validation failed",
                    "details": errors
                })
            }
            AppError::StorageError(detail) => {
                tracing::error!("Storage backend failure: {}", detail);
                serde_json::json!({
                    "error": self.code(),
                    "message": "Failed to store the uploaded image"
                })
            }
            AppError::PersistenceError(detail) => {
                tracing::error!("Record store failure: {}", detail);
                serde_json::json!({
                    "error": self.code(),
                    "message": "Failed to save the record"
                })
            }
            AppError::InternalError(detail) => {
                tracing::error!("Unexpected error: {}", detail);
                serde_json::json!({
                    "error": self.code(),
                    "message": GENERIC_ERROR_MESSAGE
                })
            }
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::UnsupportedMediaType(msg)
            | AppError::PayloadTooLarge(msg) => {
                serde_json::json!({
                    "error": self.code(),
                    "message": msg
                })
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::PersistenceError(format!("Database error: {}", err))
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Image {key} not found")),
            other => AppError::StorageError(other.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err {
            MultipartError::ContentTypeIncompatible | MultipartError::ContentTypeMissing => {
                AppError::UnsupportedMediaType("Request must be multipart/form-data".to_string())
            }
            MultipartError::Payload(_) => {
                AppError::PayloadTooLarge("Upload exceeds the allowed size".to_string())
            }
            MultipartError::DuplicateField(field) => {
                AppError::BadRequest(format!("Field '{field}' was sent more than once"))
            }
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("Access denied, no token provided")]
    MissingToken,

    #[display("Malformed token format, expected \"Bearer <token>\"")]
    MalformedToken,

    #[display("Invalid token")]
    InvalidSignature,

    #[display("Token expired, please login again")]
    Expired,

    #[display("Token verification failed: {_0}")]
    VerificationError(String),

    #[display("Invalid credentials")]
    WrongCredentials,

    #[display("Missing credentials")]
    MissingCredentials,

    #[display("Token creation error")]
    TokenCreation,

    #[display("Invalid user ID")]
    InvalidUserId,

    #[display("Missing application state")]
    MissingAppState,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_token",
            AuthError::Expired => "token_expired",
            AuthError::VerificationError(_) => "verification_error",
            AuthError::WrongCredentials => "invalid_credentials",
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::TokenCreation => "token_creation_error",
            AuthError::InvalidUserId => "invalid_user_id",
            AuthError::MissingAppState => "internal_server_error",
        }
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AuthError::VerificationError(detail) => {
                tracing::error!("Token verification failed: {}", detail);
                "Something went wrong during token verification".to_string()
            }
            AuthError::MissingAppState | AuthError::TokenCreation => {
                tracing::error!("{}", self);
                GENERIC_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({"error": self.code(), "message": message}))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::MalformedToken => StatusCode::BAD_REQUEST,
            AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AuthError::Expired => StatusCode::UNAUTHORIZED,
            AuthError::VerificationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidUserId => StatusCode::UNAUTHORIZED,
            AuthError::MissingAppState => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::InvalidSignature,
            _ => AuthError::VerificationError(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(_: ValidationErrors) -> Self {
        AuthError::MissingCredentials
    }
}

#[derive(Debug, Display)]
pub enum PasswordError {
    #[display("Invalid password parameters: {_0}")]
    InvalidParameters(String),

    #[display("Password hashing failed: {_0}")]
    HashingError(String),

    #[display("Invalid password hash format: {_0}")]
    InvalidHashFormat(String),

    #[display("Password verification failed: {_0}")]
    VerificationError(String),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}
