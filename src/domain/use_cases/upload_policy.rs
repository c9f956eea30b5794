use std::path::Path;

use crate::{entities::sighting::IncomingFile, errors::AppError};

/// An accepted image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }
}

const UNSUPPORTED_MESSAGE: &str = "Only JPEG, PNG, and GIF formats are allowed";

/// File-type and size rules applied before anything is stored.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn new(max_bytes: usize) -> Self {
        UploadPolicy { max_bytes }
    }

    /// Validates the declared metadata of the file: extension, content type and size.
    pub fn check_declared(&self, file: &IncomingFile) -> Result<ImageKind, AppError> {
        let by_extension = file
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(ImageKind::from_extension);
        let by_mime = file.content_type.as_deref().and_then(ImageKind::from_mime);

        let kind = match (by_extension, by_mime) {
            (Some(ext), Some(mime)) if ext == mime => ext,
            _ => return Err(AppError::UnsupportedMediaType(UNSUPPORTED_MESSAGE.to_string())),
        };

        if file.size > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the maximum size of {} bytes",
                self.max_bytes
            )));
        }

        Ok(kind)
    }

    /// Confirms the file content itself is the declared image format.
    pub fn check_content(&self, declared: ImageKind, bytes: &[u8]) -> Result<(), AppError> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the maximum size of {} bytes",
                self.max_bytes
            )));
        }

        match infer::get(bytes).and_then(|t| ImageKind::from_mime(t.mime_type())) {
            Some(sniffed) if sniffed == declared => Ok(()),
            _ => Err(AppError::UnsupportedMediaType(
                "File content does not match its declared image type".to_string(),
            )),
        }
    }
}
