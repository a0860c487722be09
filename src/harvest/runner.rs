//! Multi-species download runs
//!
//! Expands the configuration into an ordered list of (species, source) runs
//! and executes them one after another. Runs for the same species share a
//! directory, so a later source resumes numbering where the earlier one
//! stopped.

use crate::config::Config;
use crate::harvest::{build_http_client, harvest, HarvestSummary, Target};
use crate::source::{GbifSource, INaturalistSource, SourceKind};
use crate::{ConfigError, HarvestError};
use std::path::Path;

/// Command-line overrides applied on top of the configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Replaces `max-images-per-source`
    pub max_images: Option<usize>,

    /// Only run the species with this name (case-insensitive)
    pub species: Option<String>,

    /// Only run this source
    pub source: Option<SourceKind>,
}

/// One (species, source) pair scheduled for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRun {
    pub target: Target,
    pub source: SourceKind,
    pub max_count: usize,
}

/// Result of one executed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: PlannedRun,
    pub summary: HarvestSummary,
}

/// Expands the configuration into the ordered list of runs
///
/// Species keep their configuration order; for each species iNaturalist runs
/// before GBIF. GBIF is left out (with a warning) for species without a
/// taxon key.
///
/// # Returns
///
/// * `Ok(Vec<PlannedRun>)` - The runs to execute, possibly empty
/// * `Err(ConfigError)` - The species filter matched nothing, or an override is invalid
pub fn plan_runs(config: &Config, options: &RunOptions) -> Result<Vec<PlannedRun>, ConfigError> {
    let max_count = options
        .max_images
        .unwrap_or(config.download.max_images_per_source);
    if max_count < 1 {
        return Err(ConfigError::Validation(
            "max images must be >= 1".to_string(),
        ));
    }

    let species: Vec<_> = config
        .species
        .iter()
        .filter(|entry| match &options.species {
            Some(wanted) => entry.name.trim().eq_ignore_ascii_case(wanted.trim()),
            None => true,
        })
        .collect();

    if let Some(wanted) = &options.species {
        if species.is_empty() {
            return Err(ConfigError::Validation(format!(
                "species '{}' is not in the configuration",
                wanted
            )));
        }
    }

    let output_root = Path::new(&config.download.output_root);
    let mut runs = Vec::new();

    for entry in species {
        let target = Target::from_species(entry, output_root);

        for kind in SourceKind::ALL {
            let enabled = match kind {
                SourceKind::INaturalist => config.sources.inaturalist,
                SourceKind::Gbif => config.sources.gbif,
            };
            if !enabled || options.source.is_some_and(|only| only != kind) {
                continue;
            }

            if kind == SourceKind::Gbif && target.gbif_taxon_key.is_none() {
                tracing::warn!(
                    "Skipping GBIF for '{}': no gbif-taxon-key configured",
                    target.name
                );
                continue;
            }

            runs.push(PlannedRun {
                target: target.clone(),
                source: kind,
                max_count,
            });
        }
    }

    Ok(runs)
}

/// Executes every planned run sequentially
///
/// Page-level failures end only the affected run; the next (species, source)
/// pair still runs. Directory errors abort everything.
pub async fn run_downloads(
    config: &Config,
    options: &RunOptions,
) -> Result<Vec<RunReport>, HarvestError> {
    let runs = plan_runs(config, options)?;
    tracing::info!("Planned {} download runs", runs.len());

    let client = build_http_client(&config.http)?;
    let inaturalist = INaturalistSource::new(config.sources.inaturalist_url.as_str());
    let gbif = GbifSource::new(config.sources.gbif_url.as_str());

    let mut reports = Vec::with_capacity(runs.len());
    for run in runs {
        let summary = match run.source {
            SourceKind::INaturalist => {
                harvest(&client, &inaturalist, &run.target, run.max_count).await?
            }
            SourceKind::Gbif => harvest(&client, &gbif, &run.target, run.max_count).await?,
        };
        reports.push(RunReport { run, summary });
    }

    Ok(reports)
}
