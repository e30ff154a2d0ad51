//! Asset library operations.
//!
//! `AssetLibrary` ties the resolvers, the tag reader/writer and the cover
//! cache together behind the operations the HTTP layer exposes. Every call
//! works directly against the storage directory; nothing is cached between
//! requests.

use std::path::{Path, PathBuf};

use anyhow::Context;
use audio_locker_types::{AssetSummary, RejectedUpload, UploadedAsset};

use crate::config::{DisplayDefaults, LockerSettings};
use crate::cover_cache::CoverCache;
use crate::error::AssetError;
use crate::identity::{original_name_of, IdentityResolver};
use crate::safe_path::{Purpose, SafePathResolver};
use crate::tag_reader::{self, AssetDisplay, TagParse};
use crate::tag_writer::{write_track_tags, TagEdits};

/// A file offered for upload.
#[derive(Clone, Debug)]
pub struct UploadCandidate {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Result of a batch upload.
#[derive(Clone, Debug, Default)]
pub struct UploadReport {
    pub accepted: Vec<UploadedAsset>,
    pub rejected: Vec<RejectedUpload>,
}

#[derive(Clone, Debug)]
pub struct AssetLibrary {
    identity: IdentityResolver,
    paths: SafePathResolver,
    covers: CoverCache,
    display: DisplayDefaults,
}

impl AssetLibrary {
    pub fn new(settings: &LockerSettings) -> Self {
        Self {
            identity: IdentityResolver::new(
                settings.upload_extensions.clone(),
                settings.max_upload_bytes,
            ),
            paths: SafePathResolver::new(
                settings.storage_root.clone(),
                settings.upload_extensions.clone(),
                settings.serve_extensions.clone(),
            ),
            covers: CoverCache::new(settings.storage_root.clone()),
            display: settings.display.clone(),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.identity.max_upload_bytes()
    }

    /// Every asset in the storage root, sorted by storage name.
    pub fn list_assets(&self) -> Result<Vec<AssetSummary>, AssetError> {
        let root = self.paths.root();
        let entries = std::fs::read_dir(root).with_context(|| format!("read dir {:?}", root))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("read dir entry in {:?}", root))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !self.paths.is_asset_name(&name) {
                continue;
            }
            match self.paths.resolve(&name, Purpose::Asset) {
                Ok(path) => found.push((name, path)),
                Err(err) => {
                    tracing::debug!(name = %name, error = %err, "skipping unlisted entry");
                }
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found
            .into_iter()
            .map(|(name, path)| {
                let display = tag_reader::read(&path, &self.covers, &self.display);
                self.summarize(name, display)
            })
            .collect())
    }

    pub fn get_asset(&self, name: &str) -> Result<AssetSummary, AssetError> {
        let path = self.paths.resolve(name, Purpose::Asset)?;
        let display = tag_reader::read(&path, &self.covers, &self.display);
        Ok(self.summarize(storage_name_of(&path), display))
    }

    /// Apply tag edits and return the re-read display values.
    pub fn update_asset(&self, name: &str, edits: &TagEdits) -> Result<AssetSummary, AssetError> {
        edits.validate()?;
        let path = self.paths.resolve(name, Purpose::Asset)?;
        write_track_tags(&path, edits, &self.covers)?;
        let display = tag_reader::read(&path, &self.covers, &self.display);
        Ok(self.summarize(storage_name_of(&path), display))
    }

    /// Remove an asset and its cached cover. `Ok(false)` when it is absent.
    pub fn delete_asset(&self, name: &str) -> Result<bool, AssetError> {
        let path = match self.paths.resolve_entry(name, Purpose::Asset) {
            Ok(path) => path,
            Err(AssetError::NotFound(_)) => return Ok(false),
            Err(err) => return Err(err),
        };
        let storage_name = storage_name_of(&path);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("remove asset {:?}", path))
                    .into());
            }
        }
        self.covers.evict(&storage_name);
        tracing::info!(storage_name = %storage_name, "asset deleted");
        Ok(true)
    }

    /// Path of a servable file (asset or cover) inside the storage root.
    pub fn serve_path(&self, name: &str) -> Result<PathBuf, AssetError> {
        self.paths.resolve(name, Purpose::Serve)
    }

    /// Store one upload under a fresh storage name.
    ///
    /// Content that does not parse as MPEG audio is removed again and
    /// reported as a validation failure.
    pub fn accept_upload(&self, client_name: &str, data: &[u8]) -> Result<UploadedAsset, AssetError> {
        self.identity.check_size(data.len())?;
        let storage_name = self.identity.assign(client_name)?;
        let path = self.paths.resolve(&storage_name, Purpose::Upload)?;
        std::fs::write(&path, data).with_context(|| format!("write upload {:?}", path))?;

        if let TagParse::Unparsable(reason) = tag_reader::parse(data) {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(
                    storage_name = %storage_name,
                    error = %err,
                    "failed to remove rejected upload"
                );
            }
            tracing::info!(
                client_name,
                reason = %reason,
                "upload rejected: not mpeg audio"
            );
            return Err(AssetError::Validation(format!(
                "not a valid mp3 file: {client_name}"
            )));
        }

        tracing::info!(
            storage_name = %storage_name,
            bytes = data.len(),
            "upload stored"
        );
        Ok(UploadedAsset {
            original_name: original_name_of(&storage_name).to_string(),
            storage_name,
        })
    }

    /// Accept a batch of uploads, collecting per-file outcomes.
    pub fn accept_uploads(&self, candidates: Vec<UploadCandidate>) -> UploadReport {
        let mut report = UploadReport::default();
        for candidate in candidates {
            if !self.paths.is_asset_name(&candidate.file_name) {
                report.rejected.push(RejectedUpload {
                    file_name: candidate.file_name,
                    reason: "unsupported file type".to_string(),
                });
                continue;
            }
            match self.accept_upload(&candidate.file_name, &candidate.data) {
                Ok(uploaded) => report.accepted.push(uploaded),
                Err(err) => {
                    if let AssetError::Storage(_) = &err {
                        tracing::error!(
                            file_name = %candidate.file_name,
                            error = %err,
                            "upload failed"
                        );
                    }
                    report.rejected.push(RejectedUpload {
                        file_name: candidate.file_name,
                        reason: err.to_string(),
                    });
                }
            }
        }
        report
    }

    fn summarize(&self, storage_name: String, display: AssetDisplay) -> AssetSummary {
        AssetSummary {
            cover_url: display.cover.url(&self.display.default_cover_url),
            storage_name,
            title: display.title,
            artist: display.artist,
        }
    }
}

fn storage_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
