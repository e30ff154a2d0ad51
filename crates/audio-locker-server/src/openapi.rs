use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::tracks::tracks_list,
        api::tracks::tracks_get,
        api::tracks::tracks_metadata_update,
        api::tracks::tracks_delete,
        api::uploads::upload_track,
        api::uploads::upload_batch,
        api::files::serve_upload,
    ),
    components(
        schemas(
            audio_locker_types::AssetSummary,
            audio_locker_types::CoverUpload,
            audio_locker_types::TrackMetadataUpdateRequest,
            audio_locker_types::TrackMetadataUpdateResponse,
            audio_locker_types::DeleteResponse,
            audio_locker_types::UploadedAsset,
            audio_locker_types::UploadFile,
            audio_locker_types::UploadBatchRequest,
            audio_locker_types::RejectedUpload,
            audio_locker_types::UploadResponse,
            audio_locker_types::ErrorResponse,
            api::health::HealthResponse,
            api::uploads::UploadQuery,
        )
    ),
    tags(
        (name = "audio-locker-server", description = "Audio upload and tagging API")
    )
)]
pub struct ApiDoc;
