//! Specimen Harvest: resumable species image downloads and table-to-grid rendering
//!
//! This crate pulls species photos from paginated biodiversity APIs (iNaturalist,
//! GBIF) into per-species directories, resuming numbering from whatever is
//! already on disk. It also renders `(x, character, y)` tables scraped from a
//! published document as a character grid.

pub mod config;
pub mod grid;
pub mod harvest;
pub mod source;

use thiserror::Error;

/// Main error type for Specimen Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Page fetch error: {0}")]
    PageFetch(#[from] PageFetchError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Grid up to ({max_x}, {max_y}) exceeds the {limit}-cell limit")]
    GridTooLarge {
        max_x: usize,
        max_y: usize,
        limit: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failure to obtain one page of results from a source
///
/// Always fatal for the run against that source: the harvest loop stops and
/// keeps whatever it has already persisted.
#[derive(Debug, Error)]
pub enum PageFetchError {
    #[error("{source_name} request for cursor {cursor} failed: {error}")]
    Transport {
        source_name: &'static str,
        cursor: u64,
        error: reqwest::Error,
    },

    #[error("{source_name} returned HTTP {status} for cursor {cursor}")]
    Status {
        source_name: &'static str,
        cursor: u64,
        status: u16,
    },

    #[error("{source_name} response for cursor {cursor} could not be parsed: {error}")]
    Parse {
        source_name: &'static str,
        cursor: u64,
        error: reqwest::Error,
    },

    #[error("{source_name} cannot query target '{target}': {reason}")]
    Unsupported {
        source_name: &'static str,
        target: String,
        reason: String,
    },
}

/// Failure to fetch, decode, or save a single artifact
///
/// Never fatal: the harvest loop logs it and moves on to the next artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("request for {url} failed: {error}")]
    Transport { url: String, error: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("could not decode image from {url}: {error}")]
    Decode {
        url: String,
        error: image::ImageError,
    },

    #[error("could not save {}: {error}", path.display())]
    Save {
        path: std::path::PathBuf,
        error: image::ImageError,
    },
}

/// Result type alias for Specimen Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use grid::{build_grid, parse_table, Grid, GridCell};
pub use harvest::{harvest, HarvestSummary, StopReason, Target};
pub use source::{GbifSource, INaturalistSource, PageSource, SourceItem, SourceKind};
