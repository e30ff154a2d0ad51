//! Tag container parsing and display metadata.
//!
//! `parse` is a pure function over the file bytes and reports unreadable
//! containers as `TagParse::Unparsable`; `read` applies the fallback policy
//! on top of it so the library view always has a title, an artist and a
//! cover reference.

use std::io::Cursor;
use std::path::Path;

use lofty::config::ParseOptions;
use lofty::file::{FileType, TaggedFileExt};
use lofty::picture::MimeType;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagType};

use crate::config::DisplayDefaults;
use crate::cover_cache::{CoverCache, CoverRef};
use crate::identity::original_name_of;

const DEFAULT_PICTURE_MIME: &str = "image/jpeg";

/// First embedded picture of a tag container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedPicture {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Frames of interest read from a tag container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub picture: Option<EmbeddedPicture>,
}

/// Outcome of parsing an asset's bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagParse {
    /// A valid MPEG stream; fields are `None` when the frame is absent.
    Parsed(ParsedTags),
    /// Not an MPEG stream, or the container is corrupt.
    Unparsable(String),
}

/// Display values for one asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetDisplay {
    pub title: String,
    pub artist: String,
    pub cover: CoverRef,
}

/// Parse MPEG audio bytes and extract title, artist and the first picture.
pub fn parse(bytes: &[u8]) -> TagParse {
    match read_container(bytes) {
        Ok(tag) => TagParse::Parsed(tag.map(|tag| extract(&tag)).unwrap_or_default()),
        Err(reason) => TagParse::Unparsable(reason),
    }
}

/// Detect MPEG audio and return its ID3v2 container, if any.
pub(crate) fn read_container(bytes: &[u8]) -> Result<Option<Tag>, String> {
    let detected = Probe::new(Cursor::new(bytes))
        .options(ParseOptions::new())
        .guess_file_type()
        .map_err(|err| format!("unrecognized container: {err}"))?;
    if detected.file_type() != Some(FileType::Mpeg) {
        return Err("not an mpeg audio stream".to_string());
    }
    let tagged_file = detected
        .read()
        .map_err(|err| format!("read tags failed: {err}"))?;
    Ok(tagged_file.tag(TagType::Id3v2).cloned())
}

fn extract(tag: &Tag) -> ParsedTags {
    ParsedTags {
        title: first_text(tag.title().as_deref()),
        artist: first_text(tag.artist().as_deref()),
        picture: tag.pictures().first().map(|picture| EmbeddedPicture {
            mime_type: mime_label(picture.mime_type()),
            data: picture.data().to_vec(),
        }),
    }
}

/// First value of a possibly multi-valued text frame; blank counts as absent.
fn first_text(value: Option<&str>) -> Option<String> {
    let first = value?.split('\0').next()?;
    if first.trim().is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

fn mime_label(mime: Option<&MimeType>) -> String {
    match mime {
        Some(MimeType::Png) => "image/png".to_string(),
        Some(MimeType::Jpeg) => "image/jpeg".to_string(),
        Some(MimeType::Gif) => "image/gif".to_string(),
        Some(MimeType::Bmp) => "image/bmp".to_string(),
        Some(MimeType::Tiff) => "image/tiff".to_string(),
        Some(MimeType::Unknown(other)) if !other.trim().is_empty() => other.clone(),
        _ => DEFAULT_PICTURE_MIME.to_string(),
    }
}

/// Read display metadata for an asset, materializing its cover on the way.
pub fn read(path: &Path, covers: &CoverCache, display: &DisplayDefaults) -> AssetDisplay {
    let storage_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let parsed = match std::fs::read(path) {
        Ok(bytes) => parse(&bytes),
        Err(err) => TagParse::Unparsable(format!("open failed: {err}")),
    };
    let tags = match parsed {
        TagParse::Parsed(tags) => tags,
        TagParse::Unparsable(reason) => {
            tracing::debug!(storage_name, reason = %reason, "tag container unreadable; using fallbacks");
            ParsedTags::default()
        }
    };

    let title = display_title(tags.title.as_deref(), storage_name, &display.untitled);
    let artist = tags
        .artist
        .map(|artist| artist.trim().to_string())
        .unwrap_or_else(|| display.unknown_artist.clone());
    let cover = match tags.picture {
        Some(picture) => covers.materialize(storage_name, &picture.data, &picture.mime_type),
        None => CoverRef::Default,
    };
    AssetDisplay {
        title,
        artist,
        cover,
    }
}

/// Title from the tag if usable, else from the original file name.
fn display_title(raw: Option<&str>, storage_name: &str, untitled: &str) -> String {
    let original = Path::new(original_name_of(storage_name));
    let fallback = original
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let mut title = raw
        .map(sanitize_title)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| sanitize_title(fallback));
    if let Some(ext) = original.extension().and_then(|ext| ext.to_str()) {
        title = strip_extension_suffix(&title, ext);
    }
    if title.is_empty() {
        untitled.to_string()
    } else {
        title
    }
}

/// Keep letters (ASCII and Latin-1 accented), digits, whitespace, `.` and `-`.
pub fn sanitize_title(raw: &str) -> String {
    raw.chars()
        .filter(|ch| {
            ch.is_ascii_alphanumeric()
                || ('\u{C0}'..='\u{FF}').contains(ch)
                || ch.is_whitespace()
                || matches!(ch, '.' | '-')
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn strip_extension_suffix(title: &str, ext: &str) -> String {
    let suffix = format!(".{ext}");
    let Some(cut) = title.len().checked_sub(suffix.len()) else {
        return title.to_string();
    };
    if title.is_char_boundary(cut) && title[cut..].eq_ignore_ascii_case(&suffix) {
        title[..cut].trim().to_string()
    } else {
        title.to_string()
    }
}
