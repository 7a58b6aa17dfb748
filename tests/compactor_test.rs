//! Compactor integration tests over real files.

use std::fs;
use std::path::Path;

use trackpack::{
    compact_directory, compact_file, CollectingObserver, CompactConfig, DistanceMode,
    PipelineEvent, TrackPackError,
};

/// Build a GPX document in the shape the export service produces: metadata,
/// a typed track, per-point elevation, timestamp, and a sensor extension.
fn sample_gpx(points: &[(f64, f64, f64)]) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="Garmin Connect" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata>
    <name>Seattle Loop</name>
  </metadata>
  <trk>
    <name>Seattle Loop</name>
    <type>hiking</type>
    <trkseg>
"#,
    );
    for (lat, lon, ele) in points {
        s.push_str(&format!(
            "      <trkpt lat=\"{lat}\" lon=\"{lon}\">\n        \
             <ele>{ele}</ele>\n        \
             <time>2023-11-14T22:13:20Z</time>\n        \
             <extensions><hr>121</hr></extensions>\n      </trkpt>\n"
        ));
    }
    s.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    s
}

/// Points spaced ~11 m apart in latitude, all above the 3.5 m threshold.
fn spread_points(count: usize) -> Vec<(f64, f64, f64)> {
    (0..count)
        .map(|i| (47.6 + i as f64 * 0.0001, -122.3, 100.0))
        .collect()
}

/// Points spaced ~1.1 m apart, all below the threshold.
fn clustered_points(count: usize) -> Vec<(f64, f64, f64)> {
    (0..count)
        .map(|i| (47.6 + i as f64 * 0.00001, -122.3, 100.0))
        .collect()
}

fn write_sample(dir: &Path, name: &str, points: &[(f64, f64, f64)]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, sample_gpx(points)).unwrap();
    path
}

#[test]
fn test_widely_spaced_track_keeps_every_point() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path(), "activity_1.gpx", &spread_points(5));

    let stats = compact_file(&path, &CompactConfig::default()).unwrap();
    assert_eq!(stats.points_before, 5);
    assert_eq!(stats.points_after, 5);

    let out = fs::read_to_string(&path).unwrap();
    assert_eq!(out.matches("<trkpt").count(), 5);
}

#[test]
fn test_clustered_track_collapses_to_first_point() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path(), "activity_2.gpx", &clustered_points(8));

    let stats = compact_file(&path, &CompactConfig::default()).unwrap();
    assert_eq!(stats.points_before, 8);
    assert_eq!(stats.points_after, 1);
}

#[test]
fn test_kept_points_are_precision_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let points = vec![
        (47.6204225, -122.3493581, 54.27),
        (47.6304229, -122.3493581, 60.02),
    ];
    let path = write_sample(dir.path(), "activity_3.gpx", &points);

    compact_file(&path, &CompactConfig::default()).unwrap();

    let out = fs::read_to_string(&path).unwrap();
    assert!(out.contains("47.62042"), "lat not quantized: {}", out);
    assert!(!out.contains("47.6204225"));
    assert!(out.contains("-122.34936"));
    assert!(out.contains("54.3"));
    assert!(!out.contains("54.27"));
}

#[test]
fn test_backup_is_byte_identical_to_original() {
    let dir = tempfile::tempdir().unwrap();
    let original = sample_gpx(&spread_points(4));
    let path = dir.path().join("activity_4.gpx");
    fs::write(&path, &original).unwrap();

    compact_file(&path, &CompactConfig::default()).unwrap();

    let backup = fs::read_to_string(dir.path().join("activity_4.gpx.bak")).unwrap();
    assert_eq!(backup, original);
    // The file itself was rewritten
    assert_ne!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_envelope_survives_and_extensions_do_not() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sample(dir.path(), "activity_5.gpx", &spread_points(3));

    compact_file(&path, &CompactConfig::default()).unwrap();

    let out = fs::read_to_string(&path).unwrap();
    assert!(out.contains("Seattle Loop"));
    assert!(out.contains("<type>hiking</type>"));
    assert!(out.contains("2023-11-14T22:13:20"));
    assert!(!out.contains("<extensions>"));
    assert!(!out.contains("121"));
}

#[test]
fn test_elevation_only_movement_depends_on_distance_mode() {
    let dir = tempfile::tempdir().unwrap();
    // Stationary horizontally, climbing 5 m per sample
    let points = vec![
        (47.6, -122.3, 100.0),
        (47.6, -122.3, 105.0),
        (47.6, -122.3, 110.0),
    ];

    let path = write_sample(dir.path(), "climb_3d.gpx", &points);
    let stats = compact_file(&path, &CompactConfig::default()).unwrap();
    assert_eq!(stats.points_after, 3);

    let path = write_sample(dir.path(), "climb_flat.gpx", &points);
    let config = CompactConfig {
        distance_mode: DistanceMode::Horizontal,
        ..CompactConfig::default()
    };
    let stats = compact_file(&path, &config).unwrap();
    assert_eq!(stats.points_after, 1);
}

#[test]
fn test_file_without_track_is_an_isolated_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.gpx");
    fs::write(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="Garmin Connect" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata><name>no track</name></metadata>
</gpx>"#,
    )
    .unwrap();

    let err = compact_file(&path, &CompactConfig::default()).unwrap_err();
    assert!(matches!(err, TrackPackError::MissingTrackSegment { .. }));

    // Backed up, and the source was not rewritten
    assert!(dir.path().join("empty.gpx.bak").exists());
    assert!(fs::read_to_string(&path).unwrap().contains("no track"));
}

#[test]
fn test_directory_sweep_isolates_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(dir.path(), "activity_6.gpx", &spread_points(4));
    let bad = dir.path().join("broken.gpx");
    fs::write(&bad, "definitely not xml").unwrap();
    // Non-GPX files are not swept
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let observer = CollectingObserver::new();
    let summary = compact_directory(dir.path(), &CompactConfig::default(), &observer).unwrap();

    assert_eq!(summary.compacted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(fs::read_to_string(&bad).unwrap(), "definitely not xml");

    let events = observer.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::FileCompacted { points_before: 4, points_after: 4, .. }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, PipelineEvent::FileFailed { path, .. } if path == &bad)));
}

#[test]
fn test_second_sweep_skips_backup_files() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(dir.path(), "activity_7.gpx", &spread_points(3));

    let observer = CollectingObserver::new();
    let first = compact_directory(dir.path(), &CompactConfig::default(), &observer).unwrap();
    assert_eq!(first.compacted, 1);

    // The .bak from the first pass is not treated as a trajectory file
    let second = compact_directory(dir.path(), &CompactConfig::default(), &observer).unwrap();
    assert_eq!(second.compacted, 1);
    assert_eq!(second.failed, 0);

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&"activity_7.gpx.bak".to_string()));
    assert!(!names.contains(&"activity_7.gpx.bak.bak".to_string()));
}
