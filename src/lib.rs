pub mod config;
pub mod error;
pub mod fetcher;
pub mod log;
pub mod reference;

pub use config::FetchConfig;
pub use error::FetchError;
pub use fetcher::PackFetcher;
pub use packfetch_api::modrinth::types::{Loader, VersionType};
pub use reference::ProjectRef;
