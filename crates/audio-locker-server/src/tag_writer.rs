//! Tag container edits.
//!
//! Title, artist and cover changes are applied to one in-memory container
//! and saved with a single write; cover side files follow the embedded
//! picture.

use std::path::Path;

use anyhow::Context;
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt, TagType};

use crate::cover_cache::CoverCache;
use crate::error::AssetError;
use crate::tag_reader::read_container;

const COVER_DESCRIPTION: &str = "Cover";

/// Requested change to the embedded picture frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CoverEdit {
    #[default]
    Keep,
    Remove,
    Replace { data: Vec<u8>, mime_type: String },
}

/// Edits applied to one asset's tag container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagEdits {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub cover: CoverEdit,
}

impl TagEdits {
    /// Build edits, treating blank text values as absent.
    pub fn new(title: Option<&str>, artist: Option<&str>, cover: CoverEdit) -> Self {
        Self {
            title: non_blank(title),
            artist: non_blank(artist),
            cover,
        }
    }

    /// Reject empty edits and non-image covers before touching the disk.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.title.is_none() && self.artist.is_none() && self.cover == CoverEdit::Keep {
            return Err(AssetError::Validation("insufficient parameters".to_string()));
        }
        if let CoverEdit::Replace { mime_type, .. } = &self.cover {
            if !is_image_mime(mime_type) {
                return Err(AssetError::Validation(
                    "cover file must be an image".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Apply edits to the ID3v2 container of `path` and save it.
///
/// The container is fully mutated in memory before the single save call.
/// Cover side files are updated before saving, so a failed save can leave
/// the cached cover newer than the embedded picture until the next edit.
pub fn write_track_tags(
    path: &Path,
    edits: &TagEdits,
    covers: &CoverCache,
) -> Result<(), AssetError> {
    edits.validate()?;
    let storage_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AssetError::Validation(format!("invalid asset path {:?}", path)))?;

    let mut tag = load_container(path, storage_name);

    if let Some(value) = edits.title.as_deref() {
        tag.remove_title();
        tag.set_title(value.to_string());
    }
    if let Some(value) = edits.artist.as_deref() {
        tag.remove_artist();
        tag.set_artist(value.to_string());
    }
    match &edits.cover {
        CoverEdit::Keep => {}
        CoverEdit::Remove => {
            covers.evict(storage_name);
            clear_pictures(&mut tag);
        }
        CoverEdit::Replace { data, mime_type } => {
            covers.store(storage_name, data, mime_type)?;
            clear_pictures(&mut tag);
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(picture_mime(mime_type)),
                Some(COVER_DESCRIPTION.to_string()),
                data.clone(),
            ));
        }
    }

    tag.save_to_path(path, WriteOptions::default())
        .with_context(|| format!("write tags {:?}", path))?;
    tracing::info!(
        storage_name,
        title = edits.title.is_some(),
        artist = edits.artist.is_some(),
        cover = ?cover_action(&edits.cover),
        "asset tags updated"
    );
    Ok(())
}

/// Existing ID3v2 container, or an empty one when absent or unreadable.
fn load_container(path: &Path, storage_name: &str) -> Tag {
    let existing = std::fs::read(path)
        .map_err(|err| err.to_string())
        .and_then(|bytes| read_container(&bytes));
    match existing {
        Ok(Some(tag)) => tag,
        Ok(None) => Tag::new(TagType::Id3v2),
        Err(reason) => {
            tracing::warn!(storage_name, reason = %reason, "tag container unreadable; starting empty");
            Tag::new(TagType::Id3v2)
        }
    }
}

fn clear_pictures(tag: &mut Tag) {
    while !tag.pictures().is_empty() {
        tag.remove_picture(0);
    }
}

fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

fn picture_mime(mime: &str) -> MimeType {
    let lower = mime.trim().to_ascii_lowercase();
    match lower.as_str() {
        "image/png" => MimeType::Png,
        "image/jpeg" | "image/jpg" => MimeType::Jpeg,
        "image/gif" => MimeType::Gif,
        "image/bmp" => MimeType::Bmp,
        "image/tiff" => MimeType::Tiff,
        _ => MimeType::Unknown(lower),
    }
}

fn cover_action(edit: &CoverEdit) -> &'static str {
    match edit {
        CoverEdit::Keep => "keep",
        CoverEdit::Remove => "remove",
        CoverEdit::Replace { .. } => "replace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag_reader::{parse, EmbeddedPicture, TagParse};
    use crate::test_support::write_mpeg;

    const ASSET: &str = "0123456789abcdef0123456789abcdef_Song.mp3";
    const COVER_PNG: &str = "0123456789abcdef0123456789abcdef_Song.cover.png";
    const COVER_JPG: &str = "0123456789abcdef0123456789abcdef_Song.cover.jpg";

    fn parsed(path: &Path) -> crate::tag_reader::ParsedTags {
        match parse(&std::fs::read(path).unwrap()) {
            TagParse::Parsed(tags) => tags,
            TagParse::Unparsable(reason) => panic!("unparsable: {reason}"),
        }
    }

    fn replace(data: &[u8], mime: &str) -> CoverEdit {
        CoverEdit::Replace {
            data: data.to_vec(),
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn validate_requires_at_least_one_edit() {
        let edits = TagEdits::new(Some("   "), None, CoverEdit::Keep);
        assert!(matches!(edits.validate(), Err(AssetError::Validation(_))));
        assert!(TagEdits::new(None, None, CoverEdit::Remove).validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_image_cover() {
        let edits = TagEdits::new(None, None, replace(b"x", "text/plain"));
        assert!(matches!(edits.validate(), Err(AssetError::Validation(_))));
        let edits = TagEdits::new(None, None, replace(b"x", "IMAGE/PNG"));
        assert!(edits.validate().is_ok());
    }

    #[test]
    fn rejected_edits_leave_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let covers = CoverCache::new(dir.path().to_path_buf());
        let missing = dir.path().join(ASSET);
        let err = write_track_tags(&missing, &TagEdits::default(), &covers).unwrap_err();
        assert!(matches!(err, AssetError::Validation(_)));
        assert!(!missing.exists());
    }

    #[test]
    fn writes_title_and_artist_to_untagged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mpeg(dir.path(), ASSET);
        let covers = CoverCache::new(dir.path().to_path_buf());

        write_track_tags(&path, &TagEdits::new(Some("First"), Some("Someone"), CoverEdit::Keep), &covers)
            .unwrap();
        write_track_tags(&path, &TagEdits::new(Some("Second"), None, CoverEdit::Keep), &covers)
            .unwrap();

        let tags = parsed(&path);
        assert_eq!(tags.title.as_deref(), Some("Second"));
        assert_eq!(tags.artist.as_deref(), Some("Someone"));
        assert_eq!(tags.picture, None);
    }

    #[test]
    fn replace_cover_embeds_picture_and_caches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mpeg(dir.path(), ASSET);
        let covers = CoverCache::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join(COVER_JPG), b"stale").unwrap();

        write_track_tags(&path, &TagEdits::new(None, None, replace(b"png-bytes", "image/png")), &covers)
            .unwrap();

        assert!(!dir.path().join(COVER_JPG).exists());
        assert_eq!(std::fs::read(dir.path().join(COVER_PNG)).unwrap(), b"png-bytes");
        assert_eq!(
            parsed(&path).picture,
            Some(EmbeddedPicture {
                mime_type: "image/png".to_string(),
                data: b"png-bytes".to_vec(),
            })
        );
    }

    #[test]
    fn replace_cover_keeps_a_single_picture() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mpeg(dir.path(), ASSET);
        let covers = CoverCache::new(dir.path().to_path_buf());

        write_track_tags(&path, &TagEdits::new(None, None, replace(b"one", "image/jpeg")), &covers)
            .unwrap();
        write_track_tags(&path, &TagEdits::new(None, None, replace(b"two", "image/jpeg")), &covers)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let tag = read_container(&bytes).unwrap().expect("id3v2 tag");
        assert_eq!(tag.pictures().len(), 1);
        assert_eq!(tag.pictures()[0].data(), b"two");
        assert_eq!(std::fs::read(dir.path().join(COVER_JPG)).unwrap(), b"two");
    }

    #[test]
    fn remove_cover_drops_picture_and_side_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_mpeg(dir.path(), ASSET);
        let covers = CoverCache::new(dir.path().to_path_buf());
        write_track_tags(
            &path,
            &TagEdits::new(Some("Keep Me"), None, replace(b"art", "image/png")),
            &covers,
        )
        .unwrap();

        write_track_tags(&path, &TagEdits::new(None, None, CoverEdit::Remove), &covers).unwrap();

        let tags = parsed(&path);
        assert_eq!(tags.picture, None);
        assert_eq!(tags.title.as_deref(), Some("Keep Me"));
        assert!(!dir.path().join(COVER_PNG).exists());
    }

    #[test]
    fn save_failure_surfaces_as_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ASSET);
        std::fs::write(&path, b"definitely not audio").unwrap();
        let covers = CoverCache::new(dir.path().to_path_buf());

        let err = write_track_tags(&path, &TagEdits::new(Some("x"), None, CoverEdit::Keep), &covers)
            .unwrap_err();
        assert!(matches!(err, AssetError::Storage(_)));
    }

    #[test]
    fn picture_mime_maps_known_types() {
        assert_eq!(picture_mime("image/png"), MimeType::Png);
        assert_eq!(picture_mime(" Image/JPG "), MimeType::Jpeg);
        assert_eq!(
            picture_mime("image/webp"),
            MimeType::Unknown("image/webp".to_string())
        );
    }
}
