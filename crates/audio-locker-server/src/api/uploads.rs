//! Upload handlers.

use actix_web::{post, web, HttpResponse, Responder};
use audio_locker_types::{
    ErrorResponse, RejectedUpload, UploadBatchRequest, UploadResponse,
};
use base64::Engine;
use futures_util::StreamExt;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::AssetError;
use crate::library::UploadCandidate;
use crate::state::{AppState, Authenticated};

/// Query parameters for uploads.
#[derive(Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// File name as chosen by the client.
    pub filename: String,
}

#[utoipa::path(
    post,
    path = "/api/uploads",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Upload accepted", body = UploadResponse),
        (status = 400, description = "Not a valid audio file", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "File type not allowed", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[post("/api/uploads")]
/// Store the raw request body as a new track.
pub async fn upload_track(
    _auth: Authenticated,
    state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    mut payload: web::Payload,
) -> impl Responder {
    let limit = state.library.max_upload_bytes();
    let mut data = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                tracing::warn!(error = %err, "upload body read failed");
                return AssetError::Validation("failed to read upload body".to_string())
                    .into_response();
            }
        };
        if data.len() + chunk.len() > limit {
            tracing::info!(filename = %query.filename, limit, "upload rejected: too large");
            return AssetError::TooLarge { limit }.into_response();
        }
        data.extend_from_slice(&chunk);
    }

    let library = state.library.clone();
    let file_name = query.into_inner().filename;
    match web::block(move || library.accept_upload(&file_name, &data)).await {
        Ok(Ok(uploaded)) => HttpResponse::Ok().json(UploadResponse {
            accepted: vec![uploaded],
            rejected: Vec::new(),
            message: "upload complete".to_string(),
        }),
        Ok(Err(err)) => err.into_response(),
        Err(err) => super::blocking_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/uploads/batch",
    request_body = UploadBatchRequest,
    responses(
        (status = 200, description = "At least one file accepted", body = UploadResponse),
        (status = 400, description = "No valid file uploaded", body = UploadResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
#[post("/api/uploads/batch")]
/// Store several base64-encoded files, reporting each outcome.
pub async fn upload_batch(
    _auth: Authenticated,
    state: web::Data<AppState>,
    body: web::Json<UploadBatchRequest>,
) -> impl Responder {
    let mut rejected = Vec::new();
    let mut candidates = Vec::new();
    for file in body.into_inner().files {
        match base64::engine::general_purpose::STANDARD.decode(file.data_base64.trim()) {
            Ok(data) => candidates.push(UploadCandidate {
                file_name: file.file_name,
                data,
            }),
            Err(err) => rejected.push(RejectedUpload {
                file_name: file.file_name,
                reason: format!("invalid file data: {err}"),
            }),
        }
    }

    let library = state.library.clone();
    let report = match web::block(move || library.accept_uploads(candidates)).await {
        Ok(report) => report,
        Err(err) => return super::blocking_failed(err),
    };
    rejected.extend(report.rejected);
    let accepted = report.accepted;
    tracing::info!(
        accepted = accepted.len(),
        rejected = rejected.len(),
        "batch upload processed"
    );
    if accepted.is_empty() {
        HttpResponse::BadRequest().json(UploadResponse {
            accepted,
            rejected,
            message: "no valid file uploaded".to_string(),
        })
    } else {
        HttpResponse::Ok().json(UploadResponse {
            accepted,
            rejected,
            message: "upload complete".to_string(),
        })
    }
}
