//! trackpack CLI - batch GPX acquisition and compaction
//!
//! Usage:
//!   trackpack download [--manifest <file>] [--dest <dir>]
//!   trackpack compact [<folder>] [--threshold <meters>] [--horizontal]
//!   trackpack scrub [--manifest <file>]
//!
//! Paths not passed as flags are collected interactively, with defaults
//! taken from the environment (TRACKPACK_MANIFEST, TRACKPACK_DOWNLOAD_DIR).

use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use trackpack::{
    compact_directory, scrub_manifest, CompactConfig, DistanceMode, LogObserver, TrackPackError,
};

#[derive(Parser)]
#[command(name = "trackpack")]
#[command(about = "Batch GPS activity export and GPX compaction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download GPX exports for every activity in a manifest
    Download {
        /// Summarized-activities manifest JSON
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Folder the exports land in
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Compact GPX files in a folder
    Compact {
        /// Folder containing GPX files
        folder: Option<PathBuf>,

        /// Discard threshold in meters
        #[arg(long, default_value = "3.5")]
        threshold: f64,

        /// Ignore elevation when measuring point separation
        #[arg(long)]
        horizontal: bool,
    },

    /// Strip private fields from a manifest, in place
    Scrub {
        /// Manifest JSON to rewrite
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
    .init();

    let result = match cli.command {
        Commands::Download { manifest, dest } => run_download(manifest, dest),
        Commands::Compact {
            folder,
            threshold,
            horizontal,
        } => run_compact(folder, threshold, horizontal),
        Commands::Scrub { manifest } => run_scrub(manifest),
    };

    match result {
        Ok(()) => info!("done!"),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Ask for a path when it was not passed as a flag. An empty answer takes
/// the environment default.
fn resolve_path(
    flag: Option<PathBuf>,
    message: &str,
    env_var: &str,
) -> trackpack::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }

    let default = std::env::var(env_var).ok();
    match &default {
        Some(d) => print!("{} [{}]: ", message, d),
        None => print!("{}: ", message),
    }
    io::stdout()
        .flush()
        .map_err(|e| TrackPackError::config(e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| TrackPackError::config(e.to_string()))?;

    let answer = line.trim();
    if answer.is_empty() {
        default.map(PathBuf::from).ok_or_else(|| {
            TrackPackError::config(format!("no path given and {} is not set", env_var))
        })
    } else {
        Ok(PathBuf::from(answer))
    }
}

#[cfg(feature = "browser")]
fn run_download(manifest: Option<PathBuf>, dest: Option<PathBuf>) -> trackpack::Result<()> {
    use trackpack::{
        load_manifest, run_batch, Credentials, DownloadOutcome, ExportSession, GarminSession,
        RetryPolicy,
    };

    let manifest_path = resolve_path(
        manifest,
        "Summarized activities export JSON",
        "TRACKPACK_MANIFEST",
    )?;
    let dest_dir = resolve_path(dest, "Download folder", "TRACKPACK_DOWNLOAD_DIR")?;

    let records = load_manifest(&manifest_path)?;
    info!(
        "{} activities listed in {}",
        records.len(),
        manifest_path.display()
    );

    let credentials = Credentials::from_env()?;
    let mut session = GarminSession::launch()?;
    session.login(&credentials)?;

    let outcomes = run_batch(
        &records,
        &dest_dir,
        &mut session,
        &RetryPolicy::default(),
        &LogObserver,
    )?;

    let count = |wanted: DownloadOutcome| outcomes.iter().filter(|o| o.outcome == wanted).count();
    info!(
        "{} downloaded, {} skipped, {} failed",
        count(DownloadOutcome::Downloaded),
        count(DownloadOutcome::AlreadyPresent),
        count(DownloadOutcome::Failed)
    );
    Ok(())
}

#[cfg(not(feature = "browser"))]
fn run_download(_manifest: Option<PathBuf>, _dest: Option<PathBuf>) -> trackpack::Result<()> {
    Err(TrackPackError::config(
        "this build has no session adapter; rebuild with --features browser",
    ))
}

fn run_compact(
    folder: Option<PathBuf>,
    threshold: f64,
    horizontal: bool,
) -> trackpack::Result<()> {
    let folder = resolve_path(folder, "Input folder", "TRACKPACK_DOWNLOAD_DIR")?;

    let config = CompactConfig {
        threshold_meters: threshold,
        distance_mode: if horizontal {
            DistanceMode::Horizontal
        } else {
            DistanceMode::ThreeDimensional
        },
        ..CompactConfig::default()
    };

    let summary = compact_directory(&folder, &config, &LogObserver)?;
    info!(
        "{} files compacted, {} failed",
        summary.compacted, summary.failed
    );
    Ok(())
}

fn run_scrub(manifest: Option<PathBuf>) -> trackpack::Result<()> {
    let manifest_path = resolve_path(manifest, "Manifest JSON", "TRACKPACK_MANIFEST")?;
    let count = scrub_manifest(&manifest_path)?;
    info!(
        "{} records scrubbed in {}",
        count,
        manifest_path.display()
    );
    Ok(())
}
