//! Validation of client-supplied file names.
//!
//! Every filesystem access that originates from a request goes through
//! `SafePathResolver::resolve`. Only bare file names with an allowed
//! extension are accepted, and existing files must canonicalize to a path
//! under the storage root.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::error::AssetError;

/// What the resolved path will be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purpose {
    /// Writing a freshly uploaded asset; the file need not exist.
    Upload,
    /// Reading, editing or deleting an existing asset.
    Asset,
    /// Serving an asset or cover file to a client.
    Serve,
}

#[derive(Clone, Debug)]
pub struct SafePathResolver {
    root: PathBuf,
    asset_extensions: Vec<String>,
    serve_extensions: Vec<String>,
}

impl SafePathResolver {
    pub fn new(root: PathBuf, asset_extensions: Vec<String>, serve_extensions: Vec<String>) -> Self {
        Self {
            root,
            asset_extensions,
            serve_extensions,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// True when `name` carries one of the asset extensions.
    pub fn is_asset_name(&self, name: &str) -> bool {
        extension_of(name).is_some_and(|ext| self.asset_extensions.contains(&ext))
    }

    fn allowed(&self, purpose: Purpose) -> &[String] {
        match purpose {
            Purpose::Upload | Purpose::Asset => &self.asset_extensions,
            Purpose::Serve => &self.serve_extensions,
        }
    }

    /// Resolve a client-supplied name to an absolute path inside the root.
    pub fn resolve(&self, client_name: &str, purpose: Purpose) -> Result<PathBuf, AssetError> {
        let name = bare_file_name(client_name)?;
        self.resolve_bare(&name, purpose)
    }

    /// Like `resolve`, but returns the directory entry itself rather than
    /// the canonical target, so removing it never touches a symlink target.
    pub fn resolve_entry(&self, client_name: &str, purpose: Purpose) -> Result<PathBuf, AssetError> {
        let name = bare_file_name(client_name)?;
        self.resolve_bare(&name, purpose)?;
        Ok(self.root.join(name))
    }

    fn resolve_bare(&self, name: &str, purpose: Purpose) -> Result<PathBuf, AssetError> {
        let ext = extension_of(name).unwrap_or_default();
        if !self.allowed(purpose).contains(&ext) {
            tracing::debug!(name = %name, ?purpose, reason = "extension_not_allowed", "path rejected");
            return Err(AssetError::Forbidden(format!("file type not allowed: {name}")));
        }

        let candidate = self.root.join(name);
        if purpose == Purpose::Upload {
            return Ok(candidate);
        }

        let not_found = || AssetError::NotFound(format!("file not found: {name}"));
        let canonical = candidate.canonicalize().map_err(|_| not_found())?;
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("canonicalize storage root {:?}", self.root))?;
        if !canonical.starts_with(&root) {
            tracing::warn!(
                name = %name,
                resolved = %canonical.display(),
                reason = "outside_storage_root",
                "path rejected"
            );
            return Err(AssetError::Forbidden(format!("file not allowed: {name}")));
        }
        if !canonical.is_file() {
            return Err(not_found());
        }
        Ok(canonical)
    }
}

/// Percent-decode and require a single plain path component.
fn bare_file_name(raw: &str) -> Result<String, AssetError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| AssetError::Forbidden("invalid file name encoding".to_string()))?;
    let name = decoded.as_ref();
    let forbidden = || AssetError::Forbidden(format!("invalid file name: {raw:?}"));
    if name.is_empty() || name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        return Err(forbidden());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name.to_string()),
        _ => Err(forbidden()),
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
