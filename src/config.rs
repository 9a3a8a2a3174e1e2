use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::uldk::ULDK_ENDPOINT;

pub const DEFAULT_MAPS_URL: &str = "https://www.google.com/maps";
pub const DEFAULT_VIEWER_URL: &str = "https://mapy.geoportal.gov.pl/imap/Imgp_2.html";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub links: LinkConfig,
    pub cache: CacheConfig,
    pub hierarchy: HierarchyConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: ULDK_ENDPOINT.to_string(),
            timeout_secs: 30,
            user_agent: concat!("dzialka/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Bases of the links attached to a resolved parcel
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    pub maps_url: String,
    pub viewer_url: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            maps_url: DEFAULT_MAPS_URL.to_string(),
            viewer_url: DEFAULT_VIEWER_URL.to_string(),
        }
    }
}

impl LinkConfig {
    /// `{maps_url}?q={lat},{lon}`
    pub fn map_link(&self, lat: f64, lon: f64) -> String {
        format!("{}?q={},{}", self.maps_url, lat, lon)
    }

    /// `{viewer_url}?identifyParcel={id}`
    pub fn registry_link(&self, parcel_id: &str) -> String {
        format!("{}?identifyParcel={}", self.viewer_url, parcel_id)
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// sled directory; in-memory cache when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HierarchyConfig {
    pub path: PathBuf,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/teryt.csv"),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
