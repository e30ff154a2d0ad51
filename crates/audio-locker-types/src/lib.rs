use serde::{Deserialize, Serialize};

/// Display metadata for one stored asset, as shown in the library view.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssetSummary {
    /// Unique on-disk name (`<32 hex>_<original name>`).
    pub storage_name: String,
    /// Display title derived from the tag container or the original name.
    pub title: String,
    /// Display artist, or the unknown-artist placeholder.
    pub artist: String,
    /// URL of the cached cover file, or the default cover URL.
    pub cover_url: String,
}

/// Cover image payload sent with a metadata edit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CoverUpload {
    /// Declared MIME type; must start with `image/`.
    pub mime_type: String,
    /// Image bytes, standard base64.
    pub data_base64: String,
}

/// Metadata edit for one asset.
///
/// At least one of `title`, `artist`, `cover` or `remove_cover` must be set.
/// `remove_cover` wins over `cover` when both are present.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackMetadataUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub cover: Option<CoverUpload>,
    #[serde(default)]
    pub remove_cover: Option<bool>,
}

/// Result of a successful metadata edit, re-read from the saved file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackMetadataUpdateResponse {
    pub ok: bool,
    pub storage_name: String,
    pub title: String,
    pub artist: String,
    pub cover_url: String,
}

/// Outcome of an asset delete.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// An upload that was stored as a new asset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadedAsset {
    pub storage_name: String,
    pub original_name: String,
}

/// An upload candidate that was refused.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RejectedUpload {
    /// Client-declared file name.
    pub file_name: String,
    /// Human-readable rejection reason.
    pub reason: String,
}

/// One file of a batch upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadFile {
    /// Client-declared file name.
    pub file_name: String,
    /// File content, base64 encoded.
    pub data_base64: String,
}

/// Several files uploaded in one request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadBatchRequest {
    #[serde(default)]
    pub files: Vec<UploadFile>,
}

/// Upload batch report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadResponse {
    pub accepted: Vec<UploadedAsset>,
    pub rejected: Vec<RejectedUpload>,
    pub message: String,
}

/// Error body returned by every failing API route.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
}
