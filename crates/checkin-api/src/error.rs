use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use checkin_types::api::ErrorResponse;

/// Every failure a check-in view can be told about. `Display` is the
/// notification text shown to staff.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Could not {action}. Please try again later.")]
    Store {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("No guest was found with the given ID.")]
    GuestNotFound,

    #[error("The captured frame is not a {width}x{height} RGBA image ({len} bytes received).")]
    InvalidFrame { width: u32, height: u32, len: usize },

    #[error("No valid QR code was detected. Please try again.")]
    QrNotDetected,

    #[error("The guest ID in the request body does not match the URL.")]
    IdMismatch,
}

impl DirectoryError {
    pub fn store(action: &'static str, source: anyhow::Error) -> Self {
        Self::Store { action, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GuestNotFound => StatusCode::NOT_FOUND,
            Self::InvalidFrame { .. } | Self::IdMismatch => StatusCode::BAD_REQUEST,
            Self::QrNotDetected => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        if let Self::Store { action, source } = &self {
            error!("Failed to {}: {:#}", action, source);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
