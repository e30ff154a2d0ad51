//! Configuration loading and parsing.
//!
//! Defines the server config schema and resolves defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_BIND: &str = "0.0.0.0:5000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_UPLOAD_EXTENSIONS: [&str; 1] = ["mp3"];
const DEFAULT_SERVE_EXTENSIONS: [&str; 4] = ["mp3", "png", "jpg", "jpeg"];
const DEFAULT_COVER_URL: &str = "/static/img/default_cover.png";
const DEFAULT_UNKNOWN_ARTIST: &str = "Desconhecido";
const DEFAULT_UNTITLED: &str = "Sem título";

/// Top-level server configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Bind address (host:port).
    pub bind: Option<String>,
    /// Flat directory holding assets and cover files.
    pub storage_dir: Option<String>,
    /// Optional directory served under `/static`.
    pub static_dir: Option<String>,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Extensions accepted for uploads and asset operations.
    pub upload_extensions: Option<Vec<String>>,
    /// Extensions that may be served from the storage root.
    pub serve_extensions: Option<Vec<String>>,
    /// URL reported for assets without a cover.
    pub default_cover_url: Option<String>,
    /// Artist shown when the tag container has none.
    pub unknown_artist: Option<String>,
    /// Title shown when nothing usable survives sanitization.
    pub untitled: Option<String>,
    /// Static bearer token gating the API; open access when unset.
    pub api_token: Option<String>,
    /// Allowed CORS origins.
    pub cors_origins: Option<Vec<String>>,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ServerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }
}

/// Fallback display values applied when tags are missing or unusable.
#[derive(Debug, Clone)]
pub struct DisplayDefaults {
    pub unknown_artist: String,
    pub untitled: String,
    pub default_cover_url: String,
}

impl Default for DisplayDefaults {
    fn default() -> Self {
        Self {
            unknown_artist: DEFAULT_UNKNOWN_ARTIST.to_string(),
            untitled: DEFAULT_UNTITLED.to_string(),
            default_cover_url: DEFAULT_COVER_URL.to_string(),
        }
    }
}

/// Resolved settings handed to the asset library at construction.
#[derive(Debug, Clone)]
pub struct LockerSettings {
    pub storage_root: PathBuf,
    pub max_upload_bytes: usize,
    pub upload_extensions: Vec<String>,
    pub serve_extensions: Vec<String>,
    pub display: DisplayDefaults,
}

impl LockerSettings {
    /// Built-in defaults rooted at `storage_root`.
    pub fn with_root(storage_root: PathBuf) -> Self {
        Self {
            storage_root,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_extensions: DEFAULT_UPLOAD_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            serve_extensions: DEFAULT_SERVE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            display: DisplayDefaults::default(),
        }
    }
}

/// Build locker settings from config, filling unset values with defaults.
pub fn locker_settings_from_config(cfg: &ServerConfig, storage_root: PathBuf) -> LockerSettings {
    let mut settings = LockerSettings::with_root(storage_root);
    if let Some(limit) = cfg.max_upload_bytes.filter(|v| *v > 0) {
        settings.max_upload_bytes = limit;
    }
    if let Some(exts) = cfg.upload_extensions.as_deref() {
        let exts = normalize_extensions(exts);
        if !exts.is_empty() {
            settings.upload_extensions = exts;
        }
    }
    if let Some(exts) = cfg.serve_extensions.as_deref() {
        let exts = normalize_extensions(exts);
        if !exts.is_empty() {
            settings.serve_extensions = exts;
        }
    }
    if let Some(url) = non_empty(cfg.default_cover_url.as_deref()) {
        settings.display.default_cover_url = url;
    }
    if let Some(artist) = non_empty(cfg.unknown_artist.as_deref()) {
        settings.display.unknown_artist = artist;
    }
    if let Some(untitled) = non_empty(cfg.untitled.as_deref()) {
        settings.display.untitled = untitled;
    }
    settings
}

/// Lowercase, strip leading dots, and drop empty entries.
pub fn normalize_extensions(raw: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for ext in raw {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extract the storage directory from config.
pub fn storage_dir_from_config(cfg: &ServerConfig) -> Result<PathBuf> {
    let dir = non_empty(cfg.storage_dir.as_deref())
        .ok_or_else(|| anyhow::anyhow!("storage_dir is required in config or via --storage-dir"))?;
    Ok(PathBuf::from(dir))
}

/// Extract the optional static asset directory from config.
pub fn static_dir_from_config(cfg: &ServerConfig) -> Option<PathBuf> {
    non_empty(cfg.static_dir.as_deref()).map(PathBuf::from)
}

/// Parse the bind address from config, falling back to the default.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<SocketAddr> {
    let bind = cfg.bind.as_deref().unwrap_or(DEFAULT_BIND);
    let addr = bind.parse().with_context(|| format!("parse bind {bind}"))?;
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_from_config_parses_when_present() {
        let cfg = ServerConfig {
            bind: Some("127.0.0.1:9000".to_string()),
            ..ServerConfig::default()
        };
        let addr = bind_from_config(&cfg).unwrap();
        assert_eq!(addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn bind_from_config_defaults_when_missing() {
        let addr = bind_from_config(&ServerConfig::default()).unwrap();
        assert_eq!(addr, DEFAULT_BIND.parse().unwrap());
    }

    #[test]
    fn storage_dir_is_required() {
        assert!(storage_dir_from_config(&ServerConfig::default()).is_err());
        let cfg = ServerConfig {
            storage_dir: Some("  ".to_string()),
            ..ServerConfig::default()
        };
        assert!(storage_dir_from_config(&cfg).is_err());
    }

    #[test]
    fn settings_fill_defaults() {
        let settings =
            locker_settings_from_config(&ServerConfig::default(), PathBuf::from("/srv/uploads"));
        assert_eq!(settings.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(settings.upload_extensions, vec!["mp3"]);
        assert_eq!(settings.serve_extensions, vec!["mp3", "png", "jpg", "jpeg"]);
        assert_eq!(settings.display.unknown_artist, "Desconhecido");
    }

    #[test]
    fn settings_normalize_configured_extensions() {
        let cfg: ServerConfig = toml::from_str(
            r#"
            storage_dir = "/srv/uploads"
            upload_extensions = [".MP3", "mp3", ""]
            unknown_artist = "Unknown"
            max_upload_bytes = 1024
            "#,
        )
        .unwrap();
        let settings = locker_settings_from_config(&cfg, PathBuf::from("/srv/uploads"));
        assert_eq!(settings.upload_extensions, vec!["mp3"]);
        assert_eq!(settings.max_upload_bytes, 1024);
        assert_eq!(settings.display.unknown_artist, "Unknown");
    }
}
