//! GBIF occurrence search
//!
//! Queries `/v1/occurrence/search` by backbone taxon key for records that
//! carry still images. Pagination is offset based.

use crate::harvest::Target;
use crate::source::{endpoint, get_json, PageSource, SourceItem};
use crate::PageFetchError;
use reqwest::Client;
use serde::Deserialize;

/// Occurrence records requested per page
pub const GBIF_LIMIT: u64 = 300;

const SOURCE_NAME: &str = "GBIF";

#[derive(Debug, Deserialize)]
struct OccurrencePage {
    #[serde(default)]
    results: Option<Vec<Occurrence>>,
}

#[derive(Debug, Deserialize)]
struct Occurrence {
    #[serde(default)]
    media: Option<Vec<Media>>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    identifier: Option<String>,
}

/// Offset cursor over GBIF occurrence records
#[derive(Debug, Clone)]
pub struct GbifSource {
    base_url: String,
}

impl GbifSource {
    /// Creates a source against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl PageSource for GbifSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn page_size(&self) -> u64 {
        GBIF_LIMIT
    }

    fn first_cursor(&self) -> u64 {
        0
    }

    fn next_cursor(&self, cursor: u64) -> u64 {
        cursor + self.page_size()
    }

    async fn fetch_page(
        &self,
        client: &Client,
        target: &Target,
        cursor: u64,
    ) -> Result<Vec<SourceItem>, PageFetchError> {
        let taxon_key = target
            .gbif_taxon_key
            .ok_or_else(|| PageFetchError::Unsupported {
                source_name: SOURCE_NAME,
                target: target.name.clone(),
                reason: "no GBIF taxon key configured".to_string(),
            })?;

        let url = endpoint(&self.base_url, "/v1/occurrence/search");
        let taxon_key = taxon_key.to_string();
        let limit = self.page_size().to_string();
        let offset = cursor.to_string();
        let query = [
            ("mediaType", "StillImage"),
            ("taxonKey", taxon_key.as_str()),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];

        let listing: OccurrencePage = get_json(client, &url, &query, SOURCE_NAME, cursor).await?;
        Ok(into_items(listing))
    }
}

fn into_items(listing: OccurrencePage) -> Vec<SourceItem> {
    listing
        .results
        .unwrap_or_default()
        .into_iter()
        .map(into_item)
        .collect()
}

fn into_item(occurrence: Occurrence) -> SourceItem {
    SourceItem {
        media_urls: occurrence
            .media
            .unwrap_or_default()
            .into_iter()
            .filter_map(|media| media.identifier)
            .filter(|url| !url.is_empty())
            .collect(),
    }
}
