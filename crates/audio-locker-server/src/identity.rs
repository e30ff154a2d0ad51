//! Storage names for uploaded assets.
//!
//! A storage name is `<32 lowercase hex>_<sanitized original name>`. The
//! random prefix makes concurrent uploads collision-free without any
//! coordination; the original name is recovered by stripping it.

use std::path::Path;

use uuid::Uuid;

use crate::error::AssetError;

pub const ID_SEPARATOR: char = '_';
const ID_LEN: usize = 32;

/// Assigns storage names and enforces upload limits.
#[derive(Clone, Debug)]
pub struct IdentityResolver {
    upload_extensions: Vec<String>,
    max_upload_bytes: usize,
}

impl IdentityResolver {
    pub fn new(upload_extensions: Vec<String>, max_upload_bytes: usize) -> Self {
        Self {
            upload_extensions,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Reject uploads larger than the configured limit.
    pub fn check_size(&self, len: usize) -> Result<(), AssetError> {
        if len > self.max_upload_bytes {
            return Err(AssetError::TooLarge {
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Derive a fresh storage name for a client-declared file name.
    pub fn assign(&self, original_name: &str) -> Result<String, AssetError> {
        let sanitized = sanitize_file_name(original_name);
        if sanitized.is_empty() {
            return Err(AssetError::Validation(format!(
                "unusable file name: {original_name:?}"
            )));
        }
        let ext = Path::new(&sanitized)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !self.upload_extensions.iter().any(|allowed| *allowed == ext) {
            return Err(AssetError::Forbidden(format!(
                "unsupported file type: {sanitized}"
            )));
        }
        let id = Uuid::new_v4().simple().to_string();
        Ok(format!("{id}{ID_SEPARATOR}{sanitized}"))
    }
}

/// Recover the client's original name from a storage name.
///
/// Names without a 32-hex prefix are returned unchanged.
pub fn original_name_of(storage_name: &str) -> &str {
    let base = storage_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(storage_name);
    match base.split_once(ID_SEPARATOR) {
        Some((id, rest)) if is_opaque_id(id) => rest,
        _ => base,
    }
}

fn is_opaque_id(value: &str) -> bool {
    value.len() == ID_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Reduce a client-supplied name to a plain file name.
///
/// Keeps the final path component only, drops control characters, turns
/// whitespace runs into `_`, and keeps alphanumerics plus `.`, `-` and `_`.
/// Leading dots and underscores are stripped so the result can never be a
/// hidden file or a parent-directory reference.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let mut out = String::with_capacity(base.len());
    let mut pending_space = false;
    for ch in base.chars() {
        if ch.is_control() {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch.is_alphanumeric() || matches!(ch, '.' | '-' | '_') {
            if pending_space && !out.is_empty() {
                out.push('_');
            }
            pending_space = false;
            out.push(ch);
        }
    }
    out.trim_start_matches(['.', '_']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(vec!["mp3".to_string()], 1024)
    }

    #[test]
    fn assign_prefixes_a_lowercase_hex_id() {
        let name = resolver().assign("Song.mp3").unwrap();
        let (id, rest) = name.split_once('_').unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_eq!(rest, "Song.mp3");
    }

    #[test]
    fn assign_never_repeats() {
        let resolver = resolver();
        let first = resolver.assign("Song.mp3").unwrap();
        let second = resolver.assign("Song.mp3").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn original_name_round_trips_sanitized_name() {
        let resolver = resolver();
        for raw in [
            "Song.mp3",
            "My Track (live).mp3",
            "../../etc/evil.mp3",
            "C:\\Music\\ação.mp3",
            "__weird__name.mp3",
            "a_b_c.mp3",
        ] {
            let storage = resolver.assign(raw).unwrap();
            assert_eq!(original_name_of(&storage), sanitize_file_name(raw), "{raw}");
        }
    }

    #[test]
    fn original_name_of_leaves_unprefixed_names() {
        assert_eq!(original_name_of("Song.mp3"), "Song.mp3");
        assert_eq!(original_name_of("abc_Song.mp3"), "abc_Song.mp3");
        assert_eq!(
            original_name_of("0123456789ABCDEF0123456789ABCDEF_Song.mp3"),
            "0123456789ABCDEF0123456789ABCDEF_Song.mp3"
        );
        assert_eq!(
            original_name_of("0123456789abcdef0123456789abcdef_Song.mp3"),
            "Song.mp3"
        );
    }

    #[test]
    fn sanitize_strips_paths_and_controls() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("dir\\sub\\x.mp3"), "x.mp3");
        assert_eq!(sanitize_file_name("my\u{0}song\n.mp3"), "mysong.mp3");
        assert_eq!(sanitize_file_name("  My   Song .mp3"), "My_Song_.mp3");
        assert_eq!(sanitize_file_name("..hidden.mp3"), "hidden.mp3");
        assert_eq!(sanitize_file_name("<>|?*"), "");
    }

    #[test]
    fn assign_rejects_unusable_names() {
        let resolver = resolver();
        assert!(matches!(resolver.assign("../"), Err(AssetError::Validation(_))));
        assert!(matches!(resolver.assign("song.exe"), Err(AssetError::Forbidden(_))));
        assert!(matches!(resolver.assign("song"), Err(AssetError::Forbidden(_))));
        assert!(resolver.assign("SONG.MP3").is_ok());
    }

    #[test]
    fn check_size_enforces_limit() {
        let resolver = resolver();
        assert!(resolver.check_size(1024).is_ok());
        assert!(matches!(
            resolver.check_size(1025),
            Err(AssetError::TooLarge { limit: 1024 })
        ));
    }
}
