//! Paginated observation sources
//!
//! Each source turns a [`Target`] and a pagination cursor into one page of
//! items, where every item carries zero or more direct image URLs:
//! - iNaturalist pages by page number (starting at 1)
//! - GBIF pages by record offset (starting at 0)

mod gbif;
mod inaturalist;

pub use gbif::GbifSource;
pub use inaturalist::INaturalistSource;

use crate::harvest::Target;
use crate::PageFetchError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One result record from a source page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceItem {
    /// Direct image URLs embedded in the record, in source order
    pub media_urls: Vec<String>,
}

/// A paginated listing of items for a target
///
/// The cursor is opaque to the harvest loop: it starts at [`first_cursor`]
/// and is moved with [`next_cursor`] once per successfully fetched page.
///
/// [`first_cursor`]: PageSource::first_cursor
/// [`next_cursor`]: PageSource::next_cursor
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Human-readable source name used in log lines
    fn name(&self) -> &'static str;

    /// Number of items requested per page
    fn page_size(&self) -> u64;

    /// Cursor value for the first page
    fn first_cursor(&self) -> u64;

    /// Cursor value for the page after `cursor`
    fn next_cursor(&self, cursor: u64) -> u64;

    /// Fetches the page at `cursor`
    ///
    /// An empty vector means the source is exhausted.
    async fn fetch_page(
        &self,
        client: &Client,
        target: &Target,
        cursor: u64,
    ) -> Result<Vec<SourceItem>, PageFetchError>;
}

/// Identifies one of the supported sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    INaturalist,
    Gbif,
}

impl SourceKind {
    /// All sources, in the order they run for each species
    pub const ALL: [SourceKind; 2] = [SourceKind::INaturalist, SourceKind::Gbif];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::INaturalist => "iNaturalist",
            Self::Gbif => "GBIF",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inaturalist" | "inat" => Ok(Self::INaturalist),
            "gbif" => Ok(Self::Gbif),
            other => Err(format!(
                "unknown source '{}' (expected 'inaturalist' or 'gbif')",
                other
            )),
        }
    }
}

/// Joins an API base URL and an endpoint path
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Sends a GET with query parameters and decodes the JSON body
///
/// Transport errors, non-success statuses and undecodable bodies all map to
/// a [`PageFetchError`] tagged with the source name and cursor.
async fn get_json<T, Q>(
    client: &Client,
    url: &str,
    query: &Q,
    source_name: &'static str,
    cursor: u64,
) -> Result<T, PageFetchError>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    tracing::debug!("GET {} ({} cursor {})", url, source_name, cursor);

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|error| PageFetchError::Transport {
            source_name,
            cursor,
            error,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageFetchError::Status {
            source_name,
            cursor,
            status: status.as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|error| PageFetchError::Parse {
            source_name,
            cursor,
            error,
        })
}
