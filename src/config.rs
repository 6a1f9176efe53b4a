use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};

/// Default gallery API (serves `/api/*`, `/uploaded_images/*` and `/upload`)
const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// Default remote generation API (`/generate-art/{model}`, `/upload-data`)
const DEFAULT_GENERATION_BASE: &str = "http://localhost:8001";

/// Client configuration.
///
/// Read from `config.json` in the user's config directory:
/// - Linux: ~/.config/art-gallery/config.json
/// - macOS: ~/Library/Application Support/art-gallery/config.json
/// - Windows: %APPDATA%\art-gallery\config.json
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the gallery API
    pub api_base: String,
    /// Base URL of the remote generation API
    pub generation_base: String,
    /// Where downloads are saved (None = platform downloads directory)
    pub download_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            generation_base: DEFAULT_GENERATION_BASE.to_string(),
            download_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load the config from the default location.
    /// A missing or malformed file falls back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => {
                info!(path = %path.display(), "📁 Config loaded");
                config
            }
            Ok(None) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load the config from an explicit path.
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(Some(config))
    }

    fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("art-gallery");
        path.push("config.json");
        Some(path)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api_base", &self.api_base),
            ("generation_base", &self.generation_base),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ClientError::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Gallery API base without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Generation API base without a trailing slash
    pub fn generation_base(&self) -> &str {
        self.generation_base.trim_end_matches('/')
    }

    /// Directory downloads are written to
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    /// The directory is removed when the returned guard drops
    fn scratch_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        assert!(ClientConfig::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let (_dir, path) = scratch_file("partial.json", r#"{ "api_base": "https://gallery.test/" }"#);
        let config = ClientConfig::load_from(&path).unwrap().unwrap();

        assert_eq!(config.api_base(), "https://gallery.test");
        assert_eq!(config.generation_base, DEFAULT_GENERATION_BASE);
        assert!(config.download_dir.is_none());
    }

    #[test]
    fn test_rejects_non_http_base() {
        let (_dir, path) = scratch_file("bad.json", r#"{ "generation_base": "ftp://nope" }"#);
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_explicit_download_dir_wins() {
        let config = ClientConfig {
            download_dir: Some(PathBuf::from("/tmp/art")),
            ..ClientConfig::default()
        };
        assert_eq!(config.download_dir(), PathBuf::from("/tmp/art"));
    }
}
