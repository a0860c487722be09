//! iNaturalist observation search
//!
//! Queries `/v1/observations` by taxon name, restricted to observations with
//! photos. Photo URLs in the listing point at the square thumbnail; the
//! full-size image lives at the same URL with `square` swapped for `original`.

use crate::harvest::Target;
use crate::source::{endpoint, get_json, PageSource, SourceItem};
use crate::PageFetchError;
use reqwest::Client;
use serde::Deserialize;

/// Observations requested per page
pub const INATURALIST_PER_PAGE: u64 = 100;

const SOURCE_NAME: &str = "iNaturalist";

#[derive(Debug, Deserialize)]
struct ObservationPage {
    #[serde(default)]
    results: Option<Vec<Observation>>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(default)]
    photos: Option<Vec<Photo>>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    url: Option<String>,
}

/// Page-number cursor over iNaturalist observations
#[derive(Debug, Clone)]
pub struct INaturalistSource {
    base_url: String,
}

impl INaturalistSource {
    /// Creates a source against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl PageSource for INaturalistSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn page_size(&self) -> u64 {
        INATURALIST_PER_PAGE
    }

    fn first_cursor(&self) -> u64 {
        1
    }

    fn next_cursor(&self, cursor: u64) -> u64 {
        cursor + 1
    }

    async fn fetch_page(
        &self,
        client: &Client,
        target: &Target,
        cursor: u64,
    ) -> Result<Vec<SourceItem>, PageFetchError> {
        let url = endpoint(&self.base_url, "/v1/observations");
        let per_page = self.page_size().to_string();
        let page = cursor.to_string();
        let query = [
            ("taxon_name", target.name.as_str()),
            ("photos", "true"),
            ("per_page", per_page.as_str()),
            ("page", page.as_str()),
        ];

        let listing: ObservationPage = get_json(client, &url, &query, SOURCE_NAME, cursor).await?;
        Ok(into_items(listing))
    }
}

// `null` and missing lists both mean "nothing here"
fn into_items(listing: ObservationPage) -> Vec<SourceItem> {
    listing
        .results
        .unwrap_or_default()
        .into_iter()
        .map(into_item)
        .collect()
}

fn into_item(observation: Observation) -> SourceItem {
    SourceItem {
        media_urls: observation
            .photos
            .unwrap_or_default()
            .into_iter()
            .filter_map(|photo| photo.url)
            .filter(|url| !url.is_empty())
            .map(|url| original_size_url(&url))
            .collect(),
    }
}

/// Rewrites a thumbnail photo URL to its full-size variant
pub fn original_size_url(url: &str) -> String {
    url.replace("square", "original")
}
