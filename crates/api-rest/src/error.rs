//! JSON error responses.
//!
//! Every failure leaves the server as `{"message": ...}`. Server-side causes
//! are logged here and replaced by a generic message for the operation.

use api_shared::MessageRes;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::any::Any;
use wallpaper_core::{CatalogError, FilesError};

pub(crate) const FILE_TOO_LARGE: &str = "File size too large. Maximum size is 10MB.";
pub(crate) const NO_IMAGE: &str = "No image file provided";
pub(crate) const IMAGES_ONLY: &str = "Only image files are allowed!";
pub(crate) const NOT_FOUND: &str = "Wallpaper not found";
pub(crate) const INTERNAL: &str = "Internal server error";
pub(crate) const SEARCH_QUERY_REQUIRED: &str = "Search query is required";
pub(crate) const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub(crate) const TOO_MANY_REQUESTS: &str = "Too many requests, please try again later.";

/// The catalog operation a request was performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    List,
    Search,
    Upload,
    Delete,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch wallpapers",
            Operation::Search => "Failed to search wallpapers",
            Operation::Upload => "Failed to upload wallpaper",
            Operation::Delete => "Failed to delete wallpaper",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a core error raised while performing `operation`.
    pub(crate) fn catalog(operation: Operation, err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(message) => Self::bad_request(message),
            CatalogError::NotFound(_) => Self::not_found(NOT_FOUND),
            CatalogError::UploadLimit(FilesError::TooLarge { .. }) => {
                Self::bad_request(FILE_TOO_LARGE)
            }
            CatalogError::UploadLimit(FilesError::Empty) => Self::bad_request(NO_IMAGE),
            CatalogError::UploadLimit(_) => Self::bad_request(IMAGES_ONLY),
            other => {
                tracing::error!("{:?} wallpaper error: {:?}", operation, other);
                Self::internal(operation.failure_message())
            }
        }
    }

    /// Map a failure while reading an upload form.
    pub(crate) fn multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::bad_request(FILE_TOO_LARGE);
        }
        tracing::warn!("Malformed upload form: {}", err.body_text());
        Self::bad_request("Malformed multipart body")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageRes::new(self.message))).into_response()
    }
}

/// Response for a handler that panicked.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into());
    tracing::error!("Request handler panicked: {}", detail);
    ApiError::internal(INTERNAL).into_response()
}
