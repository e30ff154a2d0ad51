//! HTTP API handlers.
//!
//! Defines the Actix routes for track listing, metadata edits, uploads and
//! file serving.

use actix_web::HttpResponse;
use actix_web::error::BlockingError;

use crate::error::AssetError;

pub mod files;
pub mod health;
pub mod tracks;
pub mod uploads;

pub use files::serve_upload;
pub use tracks::{tracks_delete, tracks_get, tracks_list, tracks_metadata_update};
pub use uploads::{upload_batch, upload_track};

/// Response for a blocking task that could not complete.
pub(crate) fn blocking_failed(err: BlockingError) -> HttpResponse {
    AssetError::Storage(anyhow::anyhow!("blocking task failed: {err}")).into_response()
}
