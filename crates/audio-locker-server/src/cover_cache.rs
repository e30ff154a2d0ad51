//! Cover art extraction + caching helpers.
//!
//! Covers live next to their asset as `<asset base>.cover.<ext>`, so the
//! cache key is derived from the storage name alone.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const COVER_INFIX: &str = "cover";
const COVER_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Display cover for an asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoverRef {
    /// No embedded art; the UI shows the default cover.
    Default,
    /// File name of the cached cover inside the storage root.
    File(String),
}

impl CoverRef {
    pub fn url(&self, default_url: &str) -> String {
        match self {
            CoverRef::Default => default_url.to_string(),
            CoverRef::File(name) => format!("{UPLOADS_URL_PREFIX}{}", urlencoding::encode(name)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CoverCache {
    root: PathBuf,
}

impl CoverCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Cover file name for an asset and a declared MIME type.
    pub fn cover_file_name(storage_name: &str, mime_type: &str) -> String {
        format!(
            "{}.{COVER_INFIX}.{}",
            asset_base_name(storage_name),
            extension_for_mime(mime_type)
        )
    }

    /// Persist an embedded picture unless a cover is already cached.
    ///
    /// An existing file is never rewritten. Write failures degrade to the
    /// default cover.
    pub fn materialize(&self, storage_name: &str, data: &[u8], mime_type: &str) -> CoverRef {
        let file_name = Self::cover_file_name(storage_name, mime_type);
        let full_path = self.root.join(&file_name);
        if full_path.is_file() {
            return CoverRef::File(file_name);
        }
        match fs::write(&full_path, data) {
            Ok(()) => {
                tracing::debug!(storage_name, cover = %file_name, "cover cached");
                CoverRef::File(file_name)
            }
            Err(err) => {
                tracing::warn!(
                    storage_name,
                    cover = %file_name,
                    error = %err,
                    "cover cache write failed"
                );
                CoverRef::Default
            }
        }
    }

    /// Replace the cached cover unconditionally (explicit edit).
    pub fn store(&self, storage_name: &str, data: &[u8], mime_type: &str) -> Result<CoverRef> {
        self.evict(storage_name);
        let file_name = Self::cover_file_name(storage_name, mime_type);
        let full_path = self.root.join(&file_name);
        fs::write(&full_path, data).with_context(|| format!("write cover {:?}", full_path))?;
        Ok(CoverRef::File(file_name))
    }

    /// Remove every cached cover for an asset. Failures are logged only.
    pub fn evict(&self, storage_name: &str) {
        let base = asset_base_name(storage_name);
        for ext in COVER_EXTENSIONS {
            let candidate = self.root.join(format!("{base}.{COVER_INFIX}.{ext}"));
            match fs::remove_file(&candidate) {
                Ok(()) => {
                    tracing::debug!(storage_name, cover = %candidate.display(), "cover evicted");
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        storage_name,
                        cover = %candidate.display(),
                        error = %err,
                        "cover eviction failed"
                    );
                }
            }
        }
    }
}

fn asset_base_name(storage_name: &str) -> &str {
    Path::new(storage_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(storage_name)
}

fn extension_for_mime(mime: &str) -> &'static str {
    if mime.to_ascii_lowercase().contains("png") {
        "png"
    } else {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str = "0123456789abcdef0123456789abcdef_Song.mp3";

    #[test]
    fn extension_for_mime_prefers_png_then_jpg() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("IMAGE/PNG"), "png");
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/jpg"), "jpg");
        assert_eq!(extension_for_mime("image/webp"), "jpg");
        assert_eq!(extension_for_mime(""), "jpg");
    }

    #[test]
    fn cover_file_name_uses_asset_base() {
        assert_eq!(
            CoverCache::cover_file_name(ASSET, "image/png"),
            "0123456789abcdef0123456789abcdef_Song.cover.png"
        );
    }

    #[test]
    fn materialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::new(dir.path().to_path_buf());

        let first = cache.materialize(ASSET, b"first", "image/jpeg");
        let path = dir.path().join("0123456789abcdef0123456789abcdef_Song.cover.jpg");
        assert_eq!(
            first,
            CoverRef::File("0123456789abcdef0123456789abcdef_Song.cover.jpg".to_string())
        );
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();

        let second = cache.materialize(ASSET, b"second", "image/jpeg");
        assert_eq!(first, second);
        assert_eq!(fs::read(&path).unwrap(), b"first");
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn materialize_degrades_to_default_on_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::new(dir.path().join("missing-dir"));
        assert_eq!(cache.materialize(ASSET, b"x", "image/png"), CoverRef::Default);
    }

    #[test]
    fn store_replaces_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::new(dir.path().to_path_buf());
        cache.materialize(ASSET, b"old", "image/jpeg");

        let stored = cache.store(ASSET, b"new", "image/png").unwrap();
        assert_eq!(
            stored,
            CoverRef::File("0123456789abcdef0123456789abcdef_Song.cover.png".to_string())
        );
        assert!(!dir.path().join("0123456789abcdef0123456789abcdef_Song.cover.jpg").exists());
        assert_eq!(
            fs::read(dir.path().join("0123456789abcdef0123456789abcdef_Song.cover.png")).unwrap(),
            b"new"
        );
    }

    #[test]
    fn store_overwrites_same_extension() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::new(dir.path().to_path_buf());
        cache.materialize(ASSET, b"old", "image/png");
        cache.store(ASSET, b"new", "image/png").unwrap();
        assert_eq!(
            fs::read(dir.path().join("0123456789abcdef0123456789abcdef_Song.cover.png")).unwrap(),
            b"new"
        );
    }

    #[test]
    fn evict_removes_all_variants_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::new(dir.path().to_path_buf());
        for ext in COVER_EXTENSIONS {
            fs::write(
                dir.path().join(format!("0123456789abcdef0123456789abcdef_Song.cover.{ext}")),
                b"x",
            )
            .unwrap();
        }
        cache.evict(ASSET);
        cache.evict(ASSET);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn evict_continues_past_a_failed_removal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CoverCache::new(dir.path().to_path_buf());
        let blocked = dir.path().join("0123456789abcdef0123456789abcdef_Song.cover.jpg");
        let png = dir.path().join("0123456789abcdef0123456789abcdef_Song.cover.png");
        fs::create_dir(&blocked).unwrap();
        fs::write(&png, b"x").unwrap();

        cache.evict(ASSET);

        assert!(blocked.is_dir());
        assert!(!png.exists());
    }

    #[test]
    fn cover_url_points_at_uploads_or_default() {
        assert_eq!(CoverRef::Default.url("/static/default.png"), "/static/default.png");
        assert_eq!(
            CoverRef::File("a_b.cover.jpg".to_string()).url("/unused"),
            "/uploads/a_b.cover.jpg"
        );
    }
}
