use actix_web::{error::JsonPayloadError, http::StatusCode, HttpResponse, ResponseError};
use derive_more::Display;
use serde_json::json;

/// Rejection produced by the JSON extractor for bodies that fail to parse.
#[derive(Debug, Display)]
#[display("{message}")]
pub struct JsonError {
    message: String,
    status: StatusCode,
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({
            "error": "invalid_json",
            "message": self.message
        }))
    }
}

impl From<JsonPayloadError> for JsonError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match err {
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        JsonError {
            message: format!("JSON payload error: {}", err),
            status,
        }
    }
}
