use std::{env, path::PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use color_print::cprintln;
use indicatif::ProgressStyle;
use packfetch::{log, FetchConfig, Loader, ProjectRef, VersionType};
use tracing::{debug, info_span, Instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const CONFIG_FILE: &str = "packfetch.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Print debug logs
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a modpack reference and download its archive
    Fetch(FetchArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Project slug or id, `slug:version`, or a project page url
    project: String,

    /// Version id, version number, release/beta/alpha or latest
    #[arg(short, long)]
    version: Option<String>,

    #[arg(short, long = "loader", value_enum)]
    loaders: Vec<Loader>,

    #[arg(short, long = "game-version")]
    game_versions: Vec<String>,

    /// Channel used when no version is given
    #[arg(long, value_enum)]
    version_type: Option<VersionType>,

    /// Directory to write the archive to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file, defaults to ./packfetch.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    base_url: Option<String>,
}

impl Cli {
    pub async fn exec(self) -> anyhow::Result<()> {
        log::init(self.verbose);

        match self.command {
            Commands::Fetch(args) => args.exec().await,
        }
    }
}

impl FetchArgs {
    fn config(&self) -> anyhow::Result<FetchConfig> {
        if let Some(path) = &self.config {
            return FetchConfig::load(path);
        }
        let path = env::current_dir()
            .context("failed to get current_dir")?
            .join(CONFIG_FILE);
        if path.exists() {
            debug!("loading {path:?}");
            FetchConfig::load(path)
        } else {
            Ok(FetchConfig::default())
        }
    }

    async fn exec(self) -> anyhow::Result<()> {
        let mut config = self.config()?;
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if !self.loaders.is_empty() {
            config.loaders = self.loaders;
        }
        if !self.game_versions.is_empty() {
            config.game_versions = self.game_versions;
        }
        if let Some(version_type) = self.version_type {
            config.default_version_type = version_type;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }

        let reference = ProjectRef::parse(&self.project, self.version.as_deref())?;
        let fetcher = config.fetcher()?;

        let span = info_span!("download");
        span.pb_set_style(
            &ProgressStyle::with_template(
                "{spinner} {bytes}/{total_bytes} {wide_bar} {bytes_per_sec}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let progress = span.clone();
        let path = fetcher
            .fetch_with_progress(
                &reference,
                &config.loaders,
                &config.output_dir,
                move |(done, total)| {
                    progress.pb_set_length(total);
                    progress.pb_set_position(done);
                },
            )
            .instrument(span)
            .await
            .with_context(|| format!("failed to fetch {reference}"))?;

        cprintln!("<g>Fetched</> {}", path.display());
        Ok(())
    }
}
