use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
};

use packfetch_api::modrinth::{
    types::{Loader, Project, Version, VersionFile, VersionType},
    RegistryClient,
};
use packfetch_util::{download_from_url, fs::FileHash, get_url_filename};
use tracing::{debug, info, instrument};

use crate::{error::FetchError, reference::ProjectRef};

/// How a version selector is matched against a version listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Channel(VersionType),
    Latest,
    Number(&'a str),
}

impl<'a> Selector<'a> {
    /// Channel keywords and `latest` are exact lowercase words, anything
    /// else is a version number.
    pub fn classify(selector: &'a str) -> Self {
        if selector == "latest" {
            return Self::Latest;
        }
        match selector.parse::<VersionType>() {
            Ok(channel) => Self::Channel(channel),
            Err(_) => Self::Number(selector),
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Channel(channel) => version.version_type == Some(*channel),
            Self::Latest => true,
            Self::Number(number) => version.version_number == *number,
        }
    }
}

impl Display for Selector<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(channel) => Display::fmt(channel, f),
            Self::Latest => f.write_str("latest"),
            Self::Number(number) => f.write_str(number),
        }
    }
}

/// First version of a newest-first listing that `selector` accepts.
///
/// The listing order is trusted as is, ties are never re-sorted.
pub fn select_version(versions: Vec<Version>, selector: &Selector) -> Option<Version> {
    versions.into_iter().find(|v| selector.matches(v))
}

/// Name to store `file` under: its `filename`, else the decoded last URL
/// segment, reduced to a single path component.
pub fn local_filename(file: &VersionFile) -> Option<String> {
    let name = file
        .filename
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| get_url_filename(&file.url))?;
    let name = Path::new(&name).file_name()?.to_str()?;
    Some(name.to_string())
}

fn expected_hash(file: &VersionFile) -> Option<FileHash> {
    let hashes = file.hashes.as_ref()?;
    hashes
        .sha512
        .clone()
        .map(FileHash::Sha512)
        .or_else(|| hashes.sha1.clone().map(FileHash::Sha1))
}

/// Resolves project references against the registry and downloads the
/// chosen archive.
///
/// Holds no per-fetch state; clones share the client's connection pool, so
/// one fetcher can serve many concurrent fetches.
#[derive(Debug, Clone)]
pub struct PackFetcher {
    client: RegistryClient,
    game_versions: Vec<String>,
    default_version_type: VersionType,
}

impl PackFetcher {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            game_versions: vec![],
            default_version_type: VersionType::Release,
        }
    }

    /// Only list versions built for one of `game_versions`.
    pub fn with_game_versions(mut self, game_versions: Vec<String>) -> Self {
        self.game_versions = game_versions;
        self
    }

    /// Channel used when a reference carries no selector.
    pub fn with_default_version_type(mut self, version_type: VersionType) -> Self {
        self.default_version_type = version_type;
        self
    }

    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// Resolve `reference` and download its primary file into `dest_dir`.
    pub async fn fetch<P: AsRef<Path>>(
        &self,
        reference: &ProjectRef,
        loaders: &[Loader],
        dest_dir: P,
    ) -> Result<PathBuf, FetchError> {
        self.fetch_with_progress(reference, loaders, dest_dir, |_| {})
            .await
    }

    #[instrument(skip_all, fields(reference = %reference))]
    pub async fn fetch_with_progress<P: AsRef<Path>>(
        &self,
        reference: &ProjectRef,
        loaders: &[Loader],
        dest_dir: P,
        on_progress: impl Fn((u64, u64)),
    ) -> Result<PathBuf, FetchError> {
        let project = self.resolve_project(reference).await?;
        let version = self
            .resolve_version(&project, reference.version(), loaders)
            .await?;

        let file = version
            .primary_file()
            .ok_or_else(|| FetchError::NoDownloadableFile(version.id.clone()))?;
        let filename =
            local_filename(file).ok_or_else(|| FetchError::NoDownloadableFile(version.id.clone()))?;
        debug!("selected file {filename} from {}", file.url);

        let path = dest_dir.as_ref().join(&filename);
        let expected = expected_hash(file);
        if let Some(expected) = &expected {
            if smol::fs::metadata(&path).await.is_ok() {
                let up_to_date = expected.matches(&path).await.map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?;
                if up_to_date {
                    info!("{filename} is up to date, skipping download");
                    return Ok(path);
                }
            }
        }

        let path = download_from_url(
            self.client.http(),
            &file.url,
            &path,
            expected.as_ref(),
            on_progress,
        )
        .await?;
        info!("downloaded {} {} to {path:?}", project.slug, version.version_number);
        Ok(path)
    }

    pub async fn resolve_project(&self, reference: &ProjectRef) -> Result<Project, FetchError> {
        match self.client.get_project(reference.id_or_slug()).await {
            Ok(project) => {
                debug!("resolved project {} ({})", project.slug, project.id);
                Ok(project)
            }
            Err(err) if err.is_not_found() => Err(FetchError::ProjectNotFound(
                reference.id_or_slug().to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Try `selector` as a version id of `project` first, then match it
    /// against the loader filtered listing.
    pub async fn resolve_version(
        &self,
        project: &Project,
        selector: &str,
        loaders: &[Loader],
    ) -> Result<Version, FetchError> {
        if !selector.is_empty() {
            match self.client.get_version(selector).await {
                Ok(version) if version.belongs_to(project) => {
                    info!("resolved version {} by id", version.id);
                    return Ok(version);
                }
                Ok(version) => debug!(
                    "version {} belongs to {}, not {}",
                    version.id, version.project_id, project.id
                ),
                Err(err) if err.is_rejected() => debug!("{selector:?} is not a version id: {err}"),
                Err(err) => return Err(err.into()),
            }
        }

        let selector = match selector {
            "" => Selector::Channel(self.default_version_type),
            selector => Selector::classify(selector),
        };
        let versions = self
            .client
            .list_versions(&project.id, loaders, &self.game_versions)
            .await?;
        debug!("{} listed {} candidate versions", project.slug, versions.len());

        let version =
            select_version(versions, &selector).ok_or_else(|| FetchError::VersionNotFound {
                project: project.slug.clone(),
                selector: selector.to_string(),
            })?;
        info!(
            "resolved version {} ({}) from listing by {selector}",
            version.id, version.version_number
        );
        Ok(version)
    }
}
