//! Batch download orchestration.
//!
//! Drives one export session across an ordered manifest of activities,
//! strictly sequentially: the session is a single shared resource and cannot
//! safely serve concurrent navigations. Each record is deduplicated against
//! the destination directory, triggered, and then awaited with a bounded
//! exponential-backoff poll. A record's failure never aborts the batch.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::{Result, TrackPackError};
use crate::manifest::ActivityRecord;
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::session::ExportSession;
use crate::timezone;

/// Outcome of one download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A matching file already existed; the remote service was not contacted
    AlreadyPresent,
    /// The export was triggered and the file appeared within the retry budget
    Downloaded,
    /// Navigation, triggering, or completion polling failed
    Failed,
}

/// Per-record result of a batch run, in manifest order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub activity_id: String,
    pub outcome: DownloadOutcome,
}

/// Bounded completion-poll schedule: `max_attempts` checks, with
/// `base_delay * 2^k` before retry `k`.
///
/// The base delay is deliberately short. The real export latency is absorbed
/// by the session's own settling waits; this poll only covers
/// filesystem-visibility lag once the download has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Delay taken before retry `attempt` (zero-based).
    pub fn delay_before_retry(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Filename the remote service gives an activity's export.
pub fn export_filename(activity_id: &str) -> String {
    format!("activity_{}.gpx", activity_id)
}

/// Check the destination directory for an already-completed export.
///
/// Matches on filename suffix; the download mechanism may prepend its own
/// prefixes.
pub fn export_present(dir: &Path, activity_id: &str) -> Result<bool> {
    let suffix = export_filename(activity_id);
    let entries = fs::read_dir(dir).map_err(|e| TrackPackError::io(dir, &e))?;
    for entry in entries {
        let entry = entry.map_err(|e| TrackPackError::io(dir, &e))?;
        if entry.file_name().to_string_lossy().ends_with(&suffix) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Poll the destination directory until the export materializes or the
/// retry budget runs out.
fn await_export(dir: &Path, activity_id: &str, policy: &RetryPolicy) -> Result<()> {
    for attempt in 0..policy.max_attempts {
        if export_present(dir, activity_id)? {
            debug!(
                "activity_{}.gpx observed on attempt {}",
                activity_id,
                attempt + 1
            );
            return Ok(());
        }
        if attempt + 1 < policy.max_attempts {
            thread::sleep(policy.delay_before_retry(attempt));
        }
    }
    Err(TrackPackError::DownloadPending {
        activity_id: activity_id.to_string(),
        attempts: policy.max_attempts,
    })
}

/// Run a download batch over `records`, in order.
///
/// The session must already be logged in. The download sink is configured
/// once, the session is reused for every record, and it is closed after the
/// loop regardless of per-record outcomes. The returned outcomes have one
/// entry per record, in input order; the batch itself only fails on
/// configuration errors detected before any remote work.
pub fn run_batch(
    records: &[ActivityRecord],
    dest_dir: &Path,
    session: &mut dyn ExportSession,
    policy: &RetryPolicy,
    observer: &dyn PipelineObserver,
) -> Result<Vec<RecordOutcome>> {
    // An unreadable destination is fatal before any remote work begins.
    fs::read_dir(dest_dir).map_err(|e| TrackPackError::io(dest_dir, &e))?;

    if let Err(e) = session.configure_download_dir(dest_dir) {
        if let Err(close_err) = session.close() {
            warn!("session close failed: {}", close_err);
        }
        return Err(e);
    }

    let mut outcomes = Vec::with_capacity(records.len());
    for record in records {
        let activity_id = record.activity_id.to_string();
        let outcome = process_record(record, &activity_id, dest_dir, session, policy);
        observer.notify(PipelineEvent::DownloadFinished {
            activity_id: activity_id.clone(),
            outcome,
        });
        outcomes.push(RecordOutcome {
            activity_id,
            outcome,
        });
    }

    if let Err(e) = session.close() {
        warn!("session close failed: {}", e);
    }

    Ok(outcomes)
}

fn process_record(
    record: &ActivityRecord,
    activity_id: &str,
    dest_dir: &Path,
    session: &mut dyn ExportSession,
    policy: &RetryPolicy,
) -> DownloadOutcome {
    let start_time = timezone::format_start_time(
        record.begin_timestamp,
        record.start_latitude,
        record.start_longitude,
    )
    .unwrap_or_else(|| "unknown start".to_string());
    info!(
        "downloading [{}] {} ({})",
        activity_id,
        record.label(),
        start_time
    );

    match export_present(dest_dir, activity_id) {
        Ok(true) => return DownloadOutcome::AlreadyPresent,
        Ok(false) => {}
        Err(e) => {
            error!("{}", e);
            return DownloadOutcome::Failed;
        }
    }

    match download_record(activity_id, dest_dir, session, policy) {
        Ok(()) => DownloadOutcome::Downloaded,
        Err(e) => {
            error!("{}", e);
            DownloadOutcome::Failed
        }
    }
}

fn download_record(
    activity_id: &str,
    dest_dir: &Path,
    session: &mut dyn ExportSession,
    policy: &RetryPolicy,
) -> Result<()> {
    session.navigate_to_activity(activity_id)?;
    session.trigger_export()?;
    await_export(dest_dir, activity_id, policy)
}
