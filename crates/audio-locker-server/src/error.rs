//! Error kinds surfaced by the asset subsystem.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use audio_locker_types::ErrorResponse;

/// Failure of a client-facing asset operation.
///
/// Tag parse failures never appear here; the reader resolves them to
/// fallback display values.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Bad or missing request parameters.
    #[error("{0}")]
    Validation(String),
    /// Disallowed extension or a name that escapes the storage root.
    #[error("{0}")]
    Forbidden(String),
    /// Referenced asset or cover is absent.
    #[error("{0}")]
    NotFound(String),
    /// Upload larger than the configured limit.
    #[error("file exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },
    /// Disk write/remove failure on a critical path.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AssetError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            AssetError::Validation(_) => StatusCode::BAD_REQUEST,
            AssetError::Forbidden(_) => StatusCode::FORBIDDEN,
            AssetError::NotFound(_) => StatusCode::NOT_FOUND,
            AssetError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AssetError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert an asset error into an HTTP response with a JSON body.
    pub(crate) fn into_response(self) -> HttpResponse {
        let status = self.status();
        let message = match &self {
            AssetError::Storage(err) => {
                tracing::error!(error = %format!("{err:#}"), "asset storage failure");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(status).json(ErrorResponse { error: message })
    }
}
