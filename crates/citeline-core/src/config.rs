//! Configuration: defaults, optional JSON file, environment overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3004;
pub const DEFAULT_CROSSREF_URL: &str = "https://api.crossref.org";

/// Crossref REST API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossrefConfig {
    pub base_url: String,
    /// Contact address sent in the User-Agent (Crossref "polite pool").
    pub mailto: Option<String>,
    pub timeout_secs: u64,
    /// Maximum in-flight requests within one batch.
    pub max_concurrency: usize,
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CROSSREF_URL.into(),
            mailto: None,
            timeout_secs: 10,
            max_concurrency: 8,
        }
    }
}

/// Timeline canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Side length of one node box.
    pub node_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 300.0,
            node_size: 20.0,
        }
    }
}

/// Top-level Citeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitelineConfig {
    /// HTTP server port.
    pub port: u16,
    /// Reference hops expanded from a seed (1 = direct references only).
    pub traversal_depth: u32,
    /// Drop unreferenced discovered records after a seed is removed.
    pub prune_orphans_on_remove: bool,
    /// Upper bound on consecutive batches run by one sync.
    pub max_sync_rounds: usize,
    pub crossref: CrossrefConfig,
    pub layout: LayoutConfig,
}

impl Default for CitelineConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            traversal_depth: 1,
            prune_orphans_on_remove: false,
            max_sync_rounds: 4,
            crossref: CrossrefConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl CitelineConfig {
    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load from a JSON file (missing file → defaults), then apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_env();
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(port) = env_parse("PORT") {
            self.port = port;
        }
        if let Some(depth) = env_parse("CITELINE_TRAVERSAL_DEPTH") {
            self.traversal_depth = depth;
        }
        if let Ok(mailto) = std::env::var("CROSSREF_MAILTO") {
            if !mailto.trim().is_empty() {
                self.crossref.mailto = Some(mailto.trim().to_string());
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CitelineConfig::default();
        assert_eq!(config.traversal_depth, 1);
        assert!(!config.prune_orphans_on_remove);
        assert_eq!(config.crossref.base_url, DEFAULT_CROSSREF_URL);
        assert_eq!(config.layout.node_size, 20.0);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CitelineConfig::load(&dir.path().join("citeline.json")).unwrap();
        assert_eq!(config.max_sync_rounds, 4);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citeline.json");
        std::fs::write(
            &path,
            r#"{"prune_orphans_on_remove": true, "layout": {"width": 640.0}}"#,
        )
        .unwrap();

        let config = CitelineConfig::load(&path).unwrap();
        assert!(config.prune_orphans_on_remove);
        assert_eq!(config.layout.width, 640.0);
        assert_eq!(config.layout.height, 300.0);
        assert_eq!(config.crossref.timeout_secs, 10);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citeline.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(CitelineConfig::load(&path), Err(Error::Config(_))));
    }
}
