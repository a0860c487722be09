//! Specimen Harvest main entry point
//!
//! This is the command-line interface for downloading species images and
//! rendering character-grid documents.

use clap::{Parser, Subcommand};
use specimen_harvest::config::{load_config_with_hash, Config, HttpConfig};
use specimen_harvest::grid::render_document;
use specimen_harvest::harvest::{
    build_http_client, plan_runs, run_downloads, scan_next_index, RunOptions,
};
use specimen_harvest::SourceKind;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Specimen Harvest: resumable species image downloads
///
/// Downloads species photos from iNaturalist and GBIF into one folder per
/// species, continuing from the highest image number already on disk.
#[derive(Parser, Debug)]
#[command(name = "specimen-harvest")]
#[command(version)]
#[command(about = "Resumable species image downloader", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download images for every configured species
    Download {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Override max-images-per-source from the configuration
        #[arg(long, value_name = "N")]
        max_images: Option<usize>,

        /// Only download this species
        #[arg(long, value_name = "NAME")]
        species: Option<String>,

        /// Only query this source (inaturalist or gbif)
        #[arg(long, value_name = "SOURCE")]
        source: Option<SourceKind>,

        /// Show the planned runs and resume points without downloading
        #[arg(long)]
        dry_run: bool,
    },

    /// Render the (x, character, y) table of a published document as a grid
    Render {
        /// Document URL; prompted for when omitted
        #[arg(value_name = "URL")]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Download {
            config,
            max_images,
            species,
            source,
            dry_run,
        } => {
            tracing::info!("Loading configuration from: {}", config.display());
            let config = match load_config_with_hash(&config) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            };

            let options = RunOptions {
                max_images,
                species,
                source,
            };

            if dry_run {
                handle_dry_run(&config, &options)?;
            } else {
                handle_download(&config, &options).await?;
            }
        }
        Command::Render { url } => {
            let url = match url {
                Some(url) => url,
                None => prompt_for_url()?,
            };
            handle_render(&url).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("specimen_harvest=info,warn"),
            1 => EnvFilter::new("specimen_harvest=debug,info"),
            2 => EnvFilter::new("specimen_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `download --dry-run`: shows the runs and where each would resume
fn handle_dry_run(config: &Config, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let runs = plan_runs(config, options)?;

    println!("=== Specimen Harvest Dry Run ===\n");
    println!("Output root: {}", config.download.output_root);
    println!("User agent: {}", config.http.user_agent);
    println!("Timeout: {}s", config.http.timeout_secs);

    println!("\nRuns ({}):", runs.len());
    for run in &runs {
        let next_index = scan_next_index(&run.target.output_dir)?;
        let remaining = run.max_count.saturating_sub(next_index);
        println!(
            "  - {} from {}: resume at {}, limit {} ({} to go) -> {}",
            run.target.name,
            run.source,
            next_index,
            run.max_count,
            remaining,
            run.target.output_dir.display()
        );
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main download operation
async fn handle_download(
    config: &Config,
    options: &RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Species: {}, output root: {}",
        config.species.len(),
        config.download.output_root
    );

    match run_downloads(config, options).await {
        Ok(reports) => {
            let new_total: usize = reports.iter().map(|r| r.summary.new_artifacts()).sum();
            let skipped: usize = reports.iter().map(|r| r.summary.skipped).sum();
            tracing::info!(
                "Finished {} runs: {} new images, {} skipped",
                reports.len(),
                new_total,
                skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Download failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the `render` command
async fn handle_render(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client(&HttpConfig::default())?;

    match render_document(&client, url).await {
        Ok(Some(grid)) => {
            for line in grid.lines() {
                println!("{}", line);
            }
            Ok(())
        }
        Ok(None) => {
            println!("[Error] No data parsed from the document.");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Could not render document: {}", e);
            Err(e.into())
        }
    }
}

/// Reads a document URL from standard input
fn prompt_for_url() -> io::Result<String> {
    print!("Enter the URL of the document: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
