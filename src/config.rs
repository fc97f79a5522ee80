use std::{fs, path::Path, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use packfetch_api::modrinth::{
    types::{Loader, VersionType},
    ApiError, RegistryClient, HOST,
};
use serde::{Deserialize, Serialize};

use crate::fetcher::PackFetcher;

/// Settings for a fetch, usually read from `packfetch.toml`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
    pub loaders: Vec<Loader>,
    pub game_versions: Vec<String>,
    pub default_version_type: VersionType,
    pub output_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: HOST.to_string(),
            user_agent: concat!("packfetch/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
            loaders: vec![],
            game_versions: vec![],
            default_version_type: VersionType::Release,
            output_dir: PathBuf::from("."),
        }
    }
}

impl FromStr for FetchConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).context("failed to parse config")
    }
}

impl FetchConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let config = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;
        config.parse()
    }

    pub fn registry_client(&self) -> Result<RegistryClient, ApiError> {
        RegistryClient::with_options(
            &self.base_url,
            &self.user_agent,
            self.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn fetcher(&self) -> Result<PackFetcher, ApiError> {
        Ok(PackFetcher::new(self.registry_client()?)
            .with_game_versions(self.game_versions.clone())
            .with_default_version_type(self.default_version_type))
    }
}
