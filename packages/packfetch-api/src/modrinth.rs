use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;
use types::{Loader, Project, Version};

pub const HOST: &str = "https://api.modrinth.com";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("cannot encode query for {url}: {source}")]
    Encode {
        url: String,
        source: serde_json::Error,
    },

    #[error("invalid registry url {0:?}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The registry refused the identifier itself: 404, or 400 for an id it
    /// cannot parse. Auth, rate limiting and timeouts are not rejections.
    pub fn is_rejected(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Status { status, .. } => *status == StatusCode::BAD_REQUEST.as_u16(),
            _ => false,
        }
    }
}

/// Read-only client for the `/v2` project and version endpoints.
///
/// Cloning is cheap, clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base: Url,
}

impl RegistryClient {
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_options<S: AsRef<str>, U: AsRef<str>>(
        base_url: S,
        user_agent: U,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(user_agent.as_ref());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, base_url)
    }

    pub fn with_client<S: AsRef<str>>(client: Client, base_url: S) -> Result<Self, ApiError> {
        let base_url = base_url.as_ref();
        let base = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        Ok(Self { client, base })
    }

    /// The underlying HTTP client, for downloads that should share its pool.
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn get_project<S: AsRef<str>>(&self, id_or_slug: S) -> Result<Project, ApiError> {
        let url = self.endpoint(&["project", id_or_slug.as_ref()]);
        self.get_json(url).await
    }

    /// List the versions of `project_id`, newest first.
    ///
    /// Empty `loaders` or `game_versions` leave that filter off.
    pub async fn list_versions<S: AsRef<str>>(
        &self,
        project_id: S,
        loaders: &[Loader],
        game_versions: &[String],
    ) -> Result<Vec<Version>, ApiError> {
        let url = self.versions_url(project_id.as_ref(), loaders, game_versions)?;
        self.get_json(url).await
    }

    pub async fn get_version<S: AsRef<str>>(&self, version_id: S) -> Result<Version, ApiError> {
        let url = self.endpoint(&["version", version_id.as_ref()]);
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // checked in `with_client`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v2").extend(segments);
        }
        url
    }

    fn versions_url(
        &self,
        project_id: &str,
        loaders: &[Loader],
        game_versions: &[String],
    ) -> Result<Url, ApiError> {
        let mut url = self.endpoint(&["project", project_id, "version"]);
        if !loaders.is_empty() {
            let loaders = json_array(&url, loaders)?;
            url.query_pairs_mut().append_pair("loaders", &loaders);
        }
        if !game_versions.is_empty() {
            let game_versions = json_array(&url, game_versions)?;
            url.query_pairs_mut()
                .append_pair("game_versions", &game_versions);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {url}");
        let res = self.client.get(url.clone()).send().await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// `["a", "b"]`, the shape the registry expects for list filters.
fn json_array<T: Serialize>(url: &Url, items: &[T]) -> Result<String, ApiError> {
    serde_json::to_string(items).map_err(|source| ApiError::Encode {
        url: url.to_string(),
        source,
    })
}

pub mod types {
    use std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    };

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
    #[serde(rename_all = "lowercase")]
    pub enum Loader {
        Quilt,
        Fabric,
        Forge,
        #[cfg_attr(feature = "clap", value(name = "neoforge"))]
        NeoForge,
        #[cfg_attr(feature = "clap", value(name = "liteloader"))]
        LiteLoader,
        Rift,
        Bukkit,
        Folia,
        Paper,
        Spigot,
        Sponge,
        Bungeecord,
        Datapack,
        #[cfg_attr(feature = "clap", value(name = "purpur"))]
        PurPur,
    }

    impl Display for Loader {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Self::Quilt => "quilt",
                Self::Fabric => "fabric",
                Self::Forge => "forge",
                Self::NeoForge => "neoforge",
                Self::LiteLoader => "liteloader",
                Self::Rift => "rift",
                Self::Bukkit => "bukkit",
                Self::Folia => "folia",
                Self::Paper => "paper",
                Self::Spigot => "spigot",
                Self::Sponge => "sponge",
                Self::Bungeecord => "bungeecord",
                Self::Datapack => "datapack",
                Self::PurPur => "purpur",
            })
        }
    }

    /// Release channel of a version.
    #[derive(
        Debug, Serialize, Deserialize, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    )]
    #[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
    #[serde(rename_all = "lowercase")]
    pub enum VersionType {
        #[default]
        Release,
        Beta,
        Alpha,
    }

    impl Display for VersionType {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Self::Release => "release",
                Self::Beta => "beta",
                Self::Alpha => "alpha",
            })
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UnknownVersionType;

    impl Display for UnknownVersionType {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str("expected one of release, beta, alpha")
        }
    }

    impl std::error::Error for UnknownVersionType {}

    impl FromStr for VersionType {
        type Err = UnknownVersionType;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "release" => Ok(Self::Release),
                "beta" => Ok(Self::Beta),
                "alpha" => Ok(Self::Alpha),
                _ => Err(UnknownVersionType),
            }
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct Project {
        pub id: String,
        pub slug: String,
        #[serde(default)]
        pub title: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct Version {
        pub id: String,
        #[serde(default)]
        pub project_id: String,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub version_number: String,
        #[serde(default)]
        pub version_type: Option<VersionType>,
        #[serde(default)]
        pub game_versions: Vec<String>,
        // Kept as strings, the registry knows more loaders than we filter by.
        #[serde(default)]
        pub loaders: Vec<String>,
        #[serde(default)]
        pub files: Vec<VersionFile>,
    }

    impl Version {
        /// The file flagged primary, or the first one when none is.
        pub fn primary_file(&self) -> Option<&VersionFile> {
            self.files
                .iter()
                .find(|f| f.primary)
                .or_else(|| self.files.first())
        }

        /// Versions served without an owner are accepted for any project.
        pub fn belongs_to(&self, project: &Project) -> bool {
            self.project_id.is_empty() || self.project_id == project.id
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct VersionFile {
        pub url: String,
        #[serde(default)]
        pub filename: Option<String>,
        #[serde(default)]
        pub primary: bool,
        #[serde(default)]
        pub hashes: Option<VersionFileHashes>,
        #[serde(default)]
        pub size: Option<u64>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
    pub struct VersionFileHashes {
        #[serde(default)]
        pub sha1: Option<String>,
        #[serde(default)]
        pub sha512: Option<String>,
    }
}
