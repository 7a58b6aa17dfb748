//! Unified error handling for the trackpack library.
//!
//! This module provides a consistent error type for all trackpack operations,
//! covering configuration problems, session/automation failures, and
//! per-file GPX processing errors.

use std::fmt;
use std::path::Path;

/// Unified error type for trackpack operations.
#[derive(Debug, Clone)]
pub enum TrackPackError {
    /// Configuration problem detected before any remote or file work
    Config { message: String },
    /// Activity manifest could not be read or parsed
    Manifest { path: String, message: String },
    /// Export session operation failed (navigation, trigger, automation)
    Session {
        activity_id: Option<String>,
        message: String,
    },
    /// Export was triggered but the file never appeared within the retry
    /// budget
    DownloadPending { activity_id: String, attempts: u32 },
    /// GPX document could not be parsed
    GpxParse { path: String, message: String },
    /// GPX document could not be written back
    GpxWrite { path: String, message: String },
    /// GPX document is missing the expected track segment
    MissingTrackSegment { path: String },
    /// Filesystem error with the offending path
    Io { path: String, message: String },
}

impl TrackPackError {
    /// Build a `Config` error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        TrackPackError::Config {
            message: message.into(),
        }
    }

    /// Build an `Io` error from a path and source error.
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        TrackPackError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Build a `Session` error not tied to a specific activity.
    pub fn session(message: impl Into<String>) -> Self {
        TrackPackError::Session {
            activity_id: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for TrackPackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackPackError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            TrackPackError::Manifest { path, message } => {
                write!(f, "Manifest '{}': {}", path, message)
            }
            TrackPackError::Session {
                activity_id,
                message,
            } => {
                if let Some(id) = activity_id {
                    write!(f, "Session error for activity {}: {}", id, message)
                } else {
                    write!(f, "Session error: {}", message)
                }
            }
            TrackPackError::DownloadPending {
                activity_id,
                attempts,
            } => {
                write!(
                    f,
                    "activity_{}.gpx still pending or never initiated after {} attempts",
                    activity_id, attempts
                )
            }
            TrackPackError::GpxParse { path, message } => {
                write!(f, "Failed to parse '{}': {}", path, message)
            }
            TrackPackError::GpxWrite { path, message } => {
                write!(f, "Failed to write '{}': {}", path, message)
            }
            TrackPackError::MissingTrackSegment { path } => {
                write!(f, "'{}' has no track segment", path)
            }
            TrackPackError::Io { path, message } => {
                write!(f, "I/O error on '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for TrackPackError {}

/// Result type alias for trackpack operations.
pub type Result<T> = std::result::Result<T, TrackPackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackPackError::DownloadPending {
            activity_id: "12345".to_string(),
            attempts: 6,
        };
        assert!(err.to_string().contains("activity_12345.gpx"));
        assert!(err.to_string().contains("6 attempts"));
    }

    #[test]
    fn test_session_error_with_and_without_id() {
        let err = TrackPackError::Session {
            activity_id: Some("99".to_string()),
            message: "nav timeout".to_string(),
        };
        assert!(err.to_string().contains("activity 99"));

        let err = TrackPackError::session("launch failed");
        assert!(err.to_string().starts_with("Session error:"));
    }
}
