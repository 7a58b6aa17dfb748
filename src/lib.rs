//! # trackpack
//!
//! GPS activity export batching and GPX track compaction.
//!
//! This library provides:
//! - A download orchestrator that drives an authenticated export session one
//!   activity at a time, skips activities already on disk, and isolates
//!   per-activity failures
//! - A track compactor that thins GPX point sequences under a distance
//!   threshold, normalizes numeric precision, and strips per-point sensor
//!   payloads
//!
//! ## Features
//!
//! - **`browser`** - Enable the headless-Chrome Garmin Connect session adapter
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trackpack::{compact_waypoints, CompactConfig};
//! use geo::Point;
//! use gpx::Waypoint;
//!
//! // A cluster of points roughly 1.1 m apart
//! let points: Vec<Waypoint> = (0..5)
//!     .map(|i| {
//!         let mut wp = Waypoint::new(Point::new(-122.3, 47.6 + i as f64 * 0.00001));
//!         wp.elevation = Some(100.0);
//!         wp
//!     })
//!     .collect();
//!
//! // Everything within 3.5 m of its predecessor collapses away
//! let kept = compact_waypoints(&points, &CompactConfig::default());
//! assert_eq!(kept.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrackPackError};

// Geographic utilities (distance, combination modes, rounding)
pub mod geo_utils;
pub use geo_utils::DistanceMode;

// Activity manifest loading and privacy scrubbing
pub mod manifest;
pub use manifest::{load_manifest, scrub_manifest, ActivityId, ActivityRecord};

// Best-effort timezone resolution for display strings
pub mod timezone;

// The export-session port the orchestrator drives
pub mod session;
pub use session::{Credentials, ExportSession};

// Injected observability port
pub mod observer;
pub use observer::{CollectingObserver, LogObserver, PipelineEvent, PipelineObserver};

// Batch download orchestration
pub mod orchestrator;
pub use orchestrator::{run_batch, DownloadOutcome, RecordOutcome, RetryPolicy};

// GPX track compaction
pub mod compactor;
pub use compactor::{
    compact_directory, compact_file, compact_waypoints, CompactConfig, CompactStats, SweepSummary,
};

// Garmin Connect session adapter (headless Chrome)
#[cfg(feature = "browser")]
pub mod garmin;

#[cfg(feature = "browser")]
pub use garmin::GarminSession;

// ============================================================================
// Core Types
// ============================================================================

/// One sample of a recorded trajectory.
///
/// # Example
/// ```
/// use trackpack::TrackPoint;
/// let point = TrackPoint::new(47.620422, -122.349358, 54.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: f64,
}

impl TrackPoint {
    /// Create a new track point.
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }

    /// The origin point the compaction filter seeds its comparison with.
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Extract the coordinate triple from a GPX waypoint. A missing
    /// elevation reads as 0.
    pub fn from_waypoint(wp: &gpx::Waypoint) -> Self {
        let p = wp.point();
        Self::new(p.y(), p.x(), wp.elevation.unwrap_or(0.0))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_point_validation() {
        assert!(TrackPoint::new(47.6, -122.3, 54.0).is_valid());
        assert!(!TrackPoint::new(91.0, 0.0, 0.0).is_valid());
        assert!(!TrackPoint::new(0.0, 181.0, 0.0).is_valid());
        assert!(!TrackPoint::new(f64::NAN, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_from_waypoint_defaults_missing_elevation() {
        let wp = gpx::Waypoint::new(geo::Point::new(-122.3, 47.6));
        let p = TrackPoint::from_waypoint(&wp);
        assert_eq!(p.latitude, 47.6);
        assert_eq!(p.longitude, -122.3);
        assert_eq!(p.elevation, 0.0);
    }
}
