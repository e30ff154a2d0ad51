//! Track listing and metadata editing handlers.

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use audio_locker_types::{
    AssetSummary, DeleteResponse, ErrorResponse, TrackMetadataUpdateRequest,
    TrackMetadataUpdateResponse,
};
use base64::Engine;

use crate::error::AssetError;
use crate::state::{AppState, Authenticated};
use crate::tag_writer::{CoverEdit, TagEdits};

#[utoipa::path(
    get,
    path = "/api/tracks",
    responses(
        (status = 200, description = "All stored tracks", body = [AssetSummary]),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    )
)]
#[get("/api/tracks")]
/// List every stored track with its display metadata.
pub async fn tracks_list(_auth: Authenticated, state: web::Data<AppState>) -> impl Responder {
    let library = state.library.clone();
    match web::block(move || library.list_assets()).await {
        Ok(Ok(assets)) => HttpResponse::Ok().json(assets),
        Ok(Err(err)) => err.into_response(),
        Err(err) => super::blocking_failed(err),
    }
}

#[utoipa::path(
    get,
    path = "/api/tracks/{name}",
    params(
        ("name" = String, Path, description = "Storage name of the track")
    ),
    responses(
        (status = 200, description = "Track metadata", body = AssetSummary),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Name not allowed", body = ErrorResponse),
        (status = 404, description = "Track not found", body = ErrorResponse)
    )
)]
#[get("/api/tracks/{name}")]
/// Fetch display metadata for one track.
pub async fn tracks_get(
    _auth: Authenticated,
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> impl Responder {
    let library = state.library.clone();
    let name = name.into_inner();
    match web::block(move || library.get_asset(&name)).await {
        Ok(Ok(asset)) => HttpResponse::Ok().json(asset),
        Ok(Err(err)) => err.into_response(),
        Err(err) => super::blocking_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/tracks/{name}/metadata",
    params(
        ("name" = String, Path, description = "Storage name of the track")
    ),
    request_body = TrackMetadataUpdateRequest,
    responses(
        (status = 200, description = "Metadata updated", body = TrackMetadataUpdateResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Name not allowed", body = ErrorResponse),
        (status = 404, description = "Track not found", body = ErrorResponse),
        (status = 500, description = "Failed to save metadata", body = ErrorResponse)
    )
)]
#[post("/api/tracks/{name}/metadata")]
/// Update title, artist and cover of one track.
pub async fn tracks_metadata_update(
    _auth: Authenticated,
    state: web::Data<AppState>,
    name: web::Path<String>,
    body: web::Json<TrackMetadataUpdateRequest>,
) -> impl Responder {
    let edits = match edits_from_request(body.into_inner()) {
        Ok(edits) => edits,
        Err(err) => return err.into_response(),
    };
    let library = state.library.clone();
    let name = name.into_inner();
    match web::block(move || library.update_asset(&name, &edits)).await {
        Ok(Ok(asset)) => HttpResponse::Ok().json(TrackMetadataUpdateResponse {
            ok: true,
            storage_name: asset.storage_name,
            title: asset.title,
            artist: asset.artist,
            cover_url: asset.cover_url,
        }),
        Ok(Err(err)) => err.into_response(),
        Err(err) => super::blocking_failed(err),
    }
}

#[utoipa::path(
    delete,
    path = "/api/tracks/{name}",
    params(
        ("name" = String, Path, description = "Storage name of the track")
    ),
    responses(
        (status = 200, description = "Track deleted", body = DeleteResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Name not allowed", body = ErrorResponse),
        (status = 404, description = "Track not found", body = DeleteResponse)
    )
)]
#[delete("/api/tracks/{name}")]
/// Delete a track and its cached cover.
pub async fn tracks_delete(
    _auth: Authenticated,
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> impl Responder {
    let library = state.library.clone();
    let name = name.into_inner();
    match web::block(move || library.delete_asset(&name)).await {
        Ok(Ok(true)) => HttpResponse::Ok().json(DeleteResponse {
            success: true,
            message: "file deleted".to_string(),
        }),
        Ok(Ok(false)) => HttpResponse::NotFound().json(DeleteResponse {
            success: false,
            message: "file not found".to_string(),
        }),
        Ok(Err(err)) => err.into_response(),
        Err(err) => super::blocking_failed(err),
    }
}

/// Translate the wire request into tag edits; `remove_cover` wins over `cover`.
fn edits_from_request(body: TrackMetadataUpdateRequest) -> Result<TagEdits, AssetError> {
    let cover = if body.remove_cover.unwrap_or(false) {
        CoverEdit::Remove
    } else if let Some(cover) = body.cover {
        let data = base64::engine::general_purpose::STANDARD
            .decode(cover.data_base64.trim())
            .map_err(|err| AssetError::Validation(format!("invalid cover data: {err}")))?;
        CoverEdit::Replace {
            data,
            mime_type: cover.mime_type,
        }
    } else {
        CoverEdit::Keep
    };
    let edits = TagEdits::new(body.title.as_deref(), body.artist.as_deref(), cover);
    edits.validate()?;
    Ok(edits)
}
