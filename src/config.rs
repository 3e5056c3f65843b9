use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::models::FilterState;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub jellyfin: JellyfinConfig,

    #[serde(default)]
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JellyfinConfig {
    #[serde(default)]
    pub server_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_true")]
    pub persist_filters: bool,

    /// Last used filters, keyed by section id.
    #[serde(default)]
    pub filters: BTreeMap<String, FilterState>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("reel-library").join("config.toml"))
    }
}

impl Default for JellyfinConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            access_token: None,
            user_id: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            persist_filters: default_true(),
            filters: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortBy, SortOrder, ViewMode, WatchedFilter, YearRange};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.library.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.library.persist_filters);
        assert!(config.library.filters.is_empty());
        assert_eq!(config.jellyfin.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[jellyfin]\nserver_url = \"http://media.local:8096\"\n\n[library]\npage_size = 50\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.jellyfin.server_url, "http://media.local:8096");
        assert_eq!(config.library.page_size, 50);
        assert!(config.library.persist_filters);
    }

    #[test]
    fn test_saved_filters_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let filter = FilterState {
            sort_by: SortBy::DateCreated,
            sort_order: SortOrder::Descending,
            watched_filter: WatchedFilter::Unwatched,
            year_range: Some(YearRange::new(2010, 2019)),
            rating_filter: Some(6.5),
            view_mode: ViewMode::Thumbnail,
            ..FilterState::default()
        }
        .with_genre_toggled("Documentary");

        let mut config = Config::default();
        config
            .library
            .filters
            .insert("library-1".to_string(), filter.clone());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.library.filters.get("library-1"), Some(&filter));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[library\npage_size = ").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
