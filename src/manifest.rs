//! Activity manifest handling.
//!
//! A manifest is a JSON file listing the activities to acquire. Two shapes
//! are accepted: a plain array of activity records, or the account-export
//! envelope whose first element carries the array under
//! `summarizedActivitiesExport`. The manifest is read once per batch; the
//! privacy-scrub pass rewrites it in place with a fixed allow-list of fields
//! so the published copy carries no account details.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TrackPackError};

/// Envelope field holding the record array in full account exports.
const ENVELOPE_FIELD: &str = "summarizedActivitiesExport";

/// Fields the privacy-scrub pass keeps; everything else is dropped.
pub const SCRUB_ALLOWED_FIELDS: [&str; 9] = [
    "activityId",
    "name",
    "activityName",
    "beginTimestamp",
    "startLatitude",
    "startLongitude",
    "sportType",
    "distance",
    "duration",
];

/// Stable activity identifier, numeric in account exports but opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityId::Number(n) => write!(f, "{}", n),
            ActivityId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One activity to acquire and process.
///
/// Only the identifying fields are interpreted; every other manifest field
/// travels through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub activity_id: ActivityId,
    pub name: Option<String>,
    pub activity_name: Option<String>,
    /// Epoch-millisecond start time
    pub begin_timestamp: Option<i64>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    /// Opaque passthrough attributes (distance, duration, elevation, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivityRecord {
    /// Display label for log lines: the activity name if present.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.activity_name.as_deref())
            .unwrap_or("(unnamed)")
    }
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<ActivityRecord>> {
    let raw = fs::read_to_string(path).map_err(|e| TrackPackError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_manifest(&raw).map_err(|e| match e {
        TrackPackError::Manifest { message, .. } => TrackPackError::Manifest {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// Parse manifest JSON, accepting both the plain-array and envelope shapes.
pub fn parse_manifest(raw: &str) -> Result<Vec<ActivityRecord>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| TrackPackError::Manifest {
        path: String::new(),
        message: e.to_string(),
    })?;
    let records = manifest_array(&value).ok_or_else(|| TrackPackError::Manifest {
        path: String::new(),
        message: "expected a JSON array of activity records".to_string(),
    })?;
    records
        .iter()
        .map(|r| {
            serde_json::from_value(r.clone()).map_err(|e| TrackPackError::Manifest {
                path: String::new(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Rewrite a manifest in place, keeping only the allow-listed fields of each
/// record. Returns the number of records written.
pub fn scrub_manifest(path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path).map_err(|e| TrackPackError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| TrackPackError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let records = manifest_array(&value).ok_or_else(|| TrackPackError::Manifest {
        path: path.display().to_string(),
        message: "expected a JSON array of activity records".to_string(),
    })?;

    let scrubbed: Vec<Value> = records
        .iter()
        .map(|record| {
            let mut kept = Map::new();
            if let Some(fields) = record.as_object() {
                for key in SCRUB_ALLOWED_FIELDS {
                    if let Some(v) = fields.get(key) {
                        kept.insert(key.to_string(), v.clone());
                    }
                }
            }
            Value::Object(kept)
        })
        .collect();

    let out = serde_json::to_string_pretty(&scrubbed).map_err(|e| TrackPackError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(path, out).map_err(|e| TrackPackError::io(path, &e))?;
    Ok(scrubbed.len())
}

/// Locate the record array inside either accepted manifest shape.
fn manifest_array(value: &Value) -> Option<&Vec<Value>> {
    let items = value.as_array()?;
    if let Some(inner) = items
        .first()
        .and_then(|first| first.get(ENVELOPE_FIELD))
        .and_then(Value::as_array)
    {
        return Some(inner);
    }
    Some(items)
}
