//! Configuration management

use crate::error::{PlaylistError, Result};
use crate::fetch::FetchOptions;
use crate::models::{CatalogSection, MediaKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LIVE_PLAYLIST: &str =
    "https://raw.githubusercontent.com/iptv-org/iptv/refs/heads/master/streams/ad.m3u";

/// Where a catalog section is loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSource {
    /// http(s) URL, file:// URL or local path. Empty means not configured.
    #[serde(default)]
    pub url: String,
    /// Force one media kind for every entry instead of inferring it per URL
    #[serde(default)]
    pub kind_override: Option<MediaKind>,
}

impl SectionSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            kind_override: None,
        }
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind_override = Some(kind);
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_live_source")]
    pub live: SectionSource,
    #[serde(default)]
    pub movies: SectionSource,
    #[serde(default)]
    pub tvshows: SectionSource,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_playlist_bytes")]
    pub max_playlist_bytes: u64,
}

fn default_live_source() -> SectionSource { SectionSource::new(DEFAULT_LIVE_PLAYLIST) }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_connect_timeout() -> u64 { 30 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_playlist_bytes() -> u64 { 64 * 1024 * 1024 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            live: default_live_source(),
            movies: SectionSource::default(),
            tvshows: SectionSource::default(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_playlist_bytes: default_max_playlist_bytes(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("olive_player");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    /// Load from the user config dir, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Err(e) = self.save_to(&path) {
            log::warn!("Failed to save config {}: {}", path.display(), e);
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| PlaylistError::Config(e.to_string()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| PlaylistError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn source(&self, section: CatalogSection) -> &SectionSource {
        match section {
            CatalogSection::Live => &self.live,
            CatalogSection::Movies => &self.movies,
            CatalogSection::TvShows => &self.tvshows,
        }
    }

    pub fn source_mut(&mut self, section: CatalogSection) -> &mut SectionSource {
        match section {
            CatalogSection::Live => &mut self.live,
            CatalogSection::Movies => &mut self.movies,
            CatalogSection::TvShows => &mut self.tvshows,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            global_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.max_playlist_bytes,
        }
    }
}
