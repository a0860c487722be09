//! Resumable paginated image harvest
//!
//! This module contains the core download loop, including:
//! - Resuming the progress counter from files already on disk
//! - Walking a source page by page until the target count is reached
//! - Skipping single failed artifacts without stopping the run
//! - Running every configured species against every enabled source

mod fetcher;
mod runner;
pub mod store;

pub use fetcher::{build_http_client, fetch_artifact};
pub use runner::{plan_runs, run_downloads, PlannedRun, RunOptions, RunReport};
pub use store::{scan_next_index, ArtifactStore};

use crate::config::SpeciesEntry;
use crate::source::PageSource;
use crate::HarvestError;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// One species (or other subject) bound to its output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Name used for queries and file naming
    pub name: String,

    /// GBIF backbone taxon key, when known
    pub gbif_taxon_key: Option<u64>,

    /// Directory the artifacts are written to
    pub output_dir: PathBuf,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        gbif_taxon_key: Option<u64>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            gbif_taxon_key,
            output_dir: output_dir.into(),
        }
    }

    /// Builds a target whose directory is `<output_root>/<sanitized name>`
    pub fn from_species(entry: &SpeciesEntry, output_root: &Path) -> Self {
        let name = entry.name.trim();
        Self::new(
            name,
            entry.gbif_taxon_key,
            output_root.join(store::sanitize_name(name)),
        )
    }
}

/// Why a harvest loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The directory already held `max_count` or more artifacts
    AlreadyComplete,
    /// The progress counter reached `max_count`
    TargetReached,
    /// The source returned an empty page
    SourceExhausted,
    /// A page request failed; partial results were kept
    PageError(String),
}

/// Outcome of one harvest run against one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Progress counter when the run started (resume point)
    pub starting_index: usize,

    /// Final progress counter
    pub persisted: usize,

    /// Artifacts that failed to download, decode or save
    pub skipped: usize,

    /// Pages successfully fetched
    pub pages_fetched: usize,

    pub stop_reason: StopReason,
}

impl HarvestSummary {
    /// Number of artifacts written during this run
    pub fn new_artifacts(&self) -> usize {
        self.persisted - self.starting_index
    }
}

/// Downloads artifacts for `target` from `source` until `max_count` is reached
///
/// # Algorithm
///
/// 1. Open the target directory and resume the progress counter from the
///    highest existing index + 1
/// 2. While progress < `max_count`, fetch the page at the current cursor
///    - Page failure → log, stop (partial results kept)
///    - Empty page → source exhausted, stop
/// 3. For every artifact URL on the page, until `max_count` is hit:
///    - Fetch and decode; on failure log and skip
///    - On success save as `{name}_{progress}.jpg` and increment progress
/// 4. Advance the cursor by one page, whatever the page yielded
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - The run finished; `persisted` is the final count
/// * `Err(HarvestError)` - The output directory could not be created or scanned
pub async fn harvest<S: PageSource>(
    client: &Client,
    source: &S,
    target: &Target,
    max_count: usize,
) -> Result<HarvestSummary, HarvestError> {
    let store = ArtifactStore::open(&target.output_dir, &target.name)?;
    let starting_index = store.next_index()?;

    let mut summary = HarvestSummary {
        starting_index,
        persisted: starting_index,
        skipped: 0,
        pages_fetched: 0,
        stop_reason: StopReason::TargetReached,
    };

    if starting_index >= max_count {
        tracing::info!(
            "'{}' already has {} images (limit {}), skipping {}",
            target.name,
            starting_index,
            max_count,
            source.name()
        );
        summary.stop_reason = StopReason::AlreadyComplete;
        return Ok(summary);
    }

    tracing::info!(
        "Downloading {} images of '{}' from {} (resuming at index {})...",
        max_count,
        target.name,
        source.name(),
        starting_index
    );

    let mut progress = starting_index;
    let mut cursor = source.first_cursor();

    while progress < max_count {
        let items = match source.fetch_page(client, target, cursor).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Error fetching data from {}: {}", source.name(), e);
                summary.stop_reason = StopReason::PageError(e.to_string());
                break;
            }
        };
        summary.pages_fetched += 1;

        if items.is_empty() {
            tracing::info!("No more results from {}.", source.name());
            summary.stop_reason = StopReason::SourceExhausted;
            break;
        }

        tracing::debug!(
            "{} cursor {}: {} items",
            source.name(),
            cursor,
            items.len()
        );

        'page: for item in &items {
            for url in &item.media_urls {
                if progress >= max_count {
                    break 'page;
                }

                let saved = fetch_artifact(client, url)
                    .await
                    .and_then(|image| store.save(&image, progress));

                match saved {
                    Ok(path) => {
                        tracing::debug!("Saved {} -> {}", url, path.display());
                        progress += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Error downloading image: {}", e);
                        summary.skipped += 1;
                    }
                }
            }
        }

        cursor = source.next_cursor(cursor);
    }

    summary.persisted = progress;

    tracing::info!(
        "Downloaded {} images of '{}' from {} ({} new, {} skipped).",
        summary.persisted,
        target.name,
        source.name(),
        summary.new_artifacts(),
        summary.skipped
    );

    Ok(summary)
}
