//! Injected observability port.
//!
//! Both pipeline components report per-unit outcomes through a
//! [`PipelineObserver`] passed in by the caller instead of writing ambient
//! log lines, so tests can assert on emitted events. [`LogObserver`] is the
//! production sink and renders the familiar one-line-per-unit log output;
//! [`CollectingObserver`] records events for assertions.

use std::path::PathBuf;
use std::sync::Mutex;

use log::{error, info};

use crate::orchestrator::DownloadOutcome;

/// One observable unit of pipeline work.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A download attempt for one activity finished with the given outcome.
    DownloadFinished {
        activity_id: String,
        outcome: DownloadOutcome,
    },
    /// One trajectory file was compacted.
    FileCompacted {
        path: PathBuf,
        points_before: usize,
        points_after: usize,
    },
    /// One trajectory file failed to compact and was left backed up.
    FileFailed { path: PathBuf, message: String },
}

/// Sink for pipeline events.
pub trait PipelineObserver: Send + Sync {
    fn notify(&self, event: PipelineEvent);
}

/// Production observer: renders events as log lines.
#[derive(Debug, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn notify(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::DownloadFinished {
                activity_id,
                outcome,
            } => match outcome {
                DownloadOutcome::Downloaded => {
                    info!("activity_{}.gpx - downloaded", activity_id);
                }
                DownloadOutcome::AlreadyPresent => {
                    info!("activity_{}.gpx already exists - skipped", activity_id);
                }
                DownloadOutcome::Failed => {
                    error!("activity_{}.gpx - failed", activity_id);
                }
            },
            PipelineEvent::FileCompacted {
                path,
                points_before,
                points_after,
            } => {
                info!("{} {} -> {}", path.display(), points_before, points_after);
            }
            PipelineEvent::FileFailed { path, message } => {
                error!("{} conversion failed: {}", path.display(), message);
            }
        }
    }
}

/// Test observer: collects events in order.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events observed so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().expect("observer lock poisoned").clone()
    }
}

impl PipelineObserver for CollectingObserver {
    fn notify(&self, event: PipelineEvent) {
        self.events.lock().expect("observer lock poisoned").push(event);
    }
}
