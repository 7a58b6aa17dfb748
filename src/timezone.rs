//! Best-effort timezone resolution for display strings.
//!
//! The orchestrator logs each activity's local start time. The zone comes
//! from the activity's start coordinates when they are present and nonzero;
//! anything else falls back to a fixed default. Resolution never fails the
//! pipeline.

use chrono::TimeZone;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

/// Zone used when coordinates are absent, zero, or unresolvable.
pub const DEFAULT_ZONE: Tz = Tz::America__Los_Angeles;

// The finder loads its polygon data once per process.
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Resolve a display timezone from start coordinates.
pub fn resolve_zone(latitude: Option<f64>, longitude: Option<f64>) -> Tz {
    let (lat, lng) = match (latitude, longitude) {
        (Some(lat), Some(lng)) if lat != 0.0 || lng != 0.0 => (lat, lng),
        _ => return DEFAULT_ZONE,
    };
    FINDER.get_tz_name(lng, lat).parse().unwrap_or(DEFAULT_ZONE)
}

/// Format an epoch-millisecond start time in the activity's local zone,
/// e.g. `2023-11-14 1413 PST`. Returns `None` when no timestamp is known.
pub fn format_start_time(
    begin_timestamp: Option<i64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Option<String> {
    let millis = begin_timestamp?;
    let zone = resolve_zone(latitude, longitude);
    zone.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H%M %Z").to_string())
}
