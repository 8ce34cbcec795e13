use lazzfit::config::AppConfig;
use lazzfit::import::ImportManager;
use lazzfit::{compute_stats, AggregateStatsCalculator, CalorieModel, ImportError, MonthLabels};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// File-based import tests: each test writes fixtures into a temporary
// directory and loads them through the format-detecting manager.

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const GPX_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="lazzfit-tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"><time>2024-05-01T06:00:00Z</time></trkpt>
      <trkpt lat="0.0" lon="0.004491"><time>2024-05-01T06:03:00Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="0.0" lon="0.008983"><time>2024-05-01T06:06:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

#[test]
fn test_gpx_track_import() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "morning.gpx", GPX_TRACK);

    let samples = ImportManager::new().import_samples(&path).unwrap();
    assert_eq!(samples.len(), 3);

    let stats = compute_stats(&samples, &CalorieModel::default());
    assert!((stats.distance_km - 1.0).abs() < 0.01);
    assert_eq!(stats.duration_minutes, 6.0);
}

#[test]
fn test_csv_track_matches_gpx_track() {
    let dir = TempDir::new().unwrap();
    let gpx = write_fixture(&dir, "run.gpx", GPX_TRACK);
    let csv = write_fixture(
        &dir,
        "run.csv",
        "Latitude,Longitude,Timestamp\n\
         0.0,0.0,2024-05-01T06:00:00Z\n\
         0.0,0.004491,2024-05-01T06:03:00Z\n\
         0.0,0.008983,2024-05-01T06:06:00Z\n",
    );

    let manager = ImportManager::new();
    assert_eq!(
        manager.import_samples(&gpx).unwrap(),
        manager.import_samples(&csv).unwrap()
    );
}

#[test]
fn test_run_history_from_csv_and_json() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(
        &dir,
        "history.csv",
        "date,distance_km,duration_minutes,avg_heart_rate\n\
         2024-01-05,5,30,\n\
         2024-02-10,10,55,151\n",
    );
    let json = write_fixture(
        &dir,
        "history.json",
        r#"[
            {"date": "2024-01-05", "distance_km": 5, "duration_minutes": 30},
            {"date": "2024-02-10", "distance_km": 10, "duration_minutes": 55, "avg_heart_rate": 151}
        ]"#,
    );

    let manager = ImportManager::new();
    let model = CalorieModel::default();
    let from_csv = manager.import_runs(&csv, &model).unwrap();
    let from_json = manager.import_runs(&json, &model).unwrap();
    assert_eq!(from_csv, from_json);

    let summary = AggregateStatsCalculator::with_labels(MonthLabels::Portuguese).aggregate(&from_csv);
    assert_eq!(summary.total_calories_kcal, 975);
    assert_eq!(summary.per_month[0].label, "Fev/2024");
    assert_eq!(summary.per_month[1].label, "Jan/2024");
}

#[test]
fn test_empty_files_are_reported() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(&dir, "empty.csv", "latitude,longitude,timestamp\n");
    let json = write_fixture(&dir, "empty.json", "[]");

    let manager = ImportManager::new();
    assert!(matches!(
        manager.import_samples(&csv),
        Err(ImportError::Empty { .. })
    ));
    assert!(matches!(
        manager.import_runs(&json, &CalorieModel::default()),
        Err(ImportError::Empty { .. })
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = ImportManager::new().import_samples(&dir.path().join("absent.gpx"));
    assert!(matches!(result, Err(ImportError::Io(_))));
}

#[test]
fn test_config_round_trip_drives_calorie_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".lazzfit").join("config.toml");

    let mut config = AppConfig::default();
    config.athlete.weight_kg = Some(56.0);
    config.calories.kcal_per_km = 70.0;
    config.save_to_file(&path).unwrap();

    let loaded = AppConfig::load_from_file(&path).unwrap();
    // 70 kcal/km at 70 kg scales to 56 kcal/km at 56 kg
    assert_eq!(loaded.calorie_model().estimate(10.0), Some(560));
    assert!(loaded.metadata.updated_at >= config.metadata.created_at);
}
