use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ImportError;
use crate::models::{LocationSample, RunRecord};
use crate::run_stats::CalorieModel;

pub mod csv;
pub mod gpx;
pub mod json;

/// Trait for loading tracks and run histories from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Load a recorded track as location samples, in file order
    fn import_samples(&self, file_path: &Path) -> Result<Vec<LocationSample>, ImportError>;

    /// Load a run history. Formats that only carry tracks reject this.
    fn import_runs(
        &self,
        _file_path: &Path,
        _calories: &CalorieModel,
    ) -> Result<Vec<RunRecord>, ImportError> {
        Err(ImportError::UnsupportedFormat {
            format: format!("{} run history", self.get_format_name()),
        })
    }

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(gpx::GpxImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    fn importer_for(&self, file_path: &Path) -> Result<&dyn ImportFormat, ImportError> {
        self.importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .map(|importer| importer.as_ref())
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })
    }

    /// Load location samples, auto-detecting the format
    pub fn import_samples(&self, file_path: &Path) -> Result<Vec<LocationSample>, ImportError> {
        let importer = self.importer_for(file_path)?;
        info!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            "Importing track"
        );

        let samples = importer.import_samples(file_path)?;
        if samples.is_empty() {
            return Err(ImportError::Empty {
                source_name: file_path.display().to_string(),
            });
        }

        debug!(samples = samples.len(), "Track imported");
        Ok(samples)
    }

    /// Load run records, auto-detecting the format
    pub fn import_runs(
        &self,
        file_path: &Path,
        calories: &CalorieModel,
    ) -> Result<Vec<RunRecord>, ImportError> {
        let importer = self.importer_for(file_path)?;
        info!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            "Importing run history"
        );

        let runs = importer.import_runs(file_path, calories)?;
        if runs.is_empty() {
            return Err(ImportError::Empty {
                source_name: file_path.display().to_string(),
            });
        }

        debug!(runs = runs.len(), "Run history imported");
        Ok(runs)
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers
            .iter()
            .any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A manually entered or exported run, before pace and calories are derived
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunEntry {
    pub date: NaiveDate,
    #[serde(alias = "distance")]
    pub distance_km: f64,
    #[serde(alias = "duration")]
    pub duration_minutes: f64,
    #[serde(default, alias = "heart_rate", alias = "hr")]
    pub avg_heart_rate: Option<u16>,
    /// Measured calories override the model estimate
    #[serde(default, alias = "calories")]
    pub calories_kcal: Option<u32>,
}

impl RunEntry {
    /// Validate the entry and derive the full record
    pub fn into_record(self, calories: &CalorieModel) -> Result<RunRecord, ImportError> {
        check_non_negative("distance_km", self.distance_km)?;
        check_non_negative("duration_minutes", self.duration_minutes)?;

        let mut record =
            RunRecord::new(self.date, self.distance_km, self.duration_minutes, calories)
                .with_heart_rate(self.avg_heart_rate);
        if let Some(kcal) = self.calories_kcal {
            record = record.with_calories(kcal);
        }
        Ok(record)
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ImportError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ImportError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Reject coordinates that cannot be on Earth
pub(crate) fn validate_sample(sample: LocationSample) -> Result<LocationSample, ImportError> {
    let in_range = |value: f64, limit: f64| value.is_finite() && value.abs() <= limit;

    if !in_range(sample.latitude, 90.0) {
        return Err(ImportError::InvalidValue {
            field: "latitude".to_string(),
            value: sample.latitude.to_string(),
        });
    }
    if !in_range(sample.longitude, 180.0) {
        return Err(ImportError::InvalidValue {
            field: "longitude".to_string(),
            value: sample.longitude.to_string(),
        });
    }
    Ok(sample)
}

pub(crate) fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

pub(crate) fn parse_error(format: &str, error: impl Display) -> ImportError {
    ImportError::Parse {
        format: format.to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importer_selection() {
        let manager = ImportManager::new();

        assert!(manager.can_import_file(Path::new("morning.GPX")));
        assert!(manager.can_import_file(Path::new("runs.csv")));
        assert!(manager.can_import_file(Path::new("runs.json")));
        assert!(!manager.can_import_file(Path::new("ride.fit")));

        match manager.import_samples(Path::new("ride.fit")) {
            Err(ImportError::UnsupportedFormat { format }) => assert_eq!(format, "fit"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }

    #[test]
    fn test_run_entry_validation() {
        let model = CalorieModel::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

        let entry = RunEntry {
            date,
            distance_km: 5.0,
            duration_minutes: 30.0,
            avg_heart_rate: Some(152),
            calories_kcal: None,
        };
        let record = entry.clone().into_record(&model).unwrap();
        assert_eq!(record.pace_min_per_km, Some(6.0));
        assert_eq!(record.calories_kcal, Some(325));
        assert_eq!(record.avg_heart_rate, Some(152));

        let measured = RunEntry {
            calories_kcal: Some(410),
            ..entry.clone()
        };
        assert_eq!(measured.into_record(&model).unwrap().calories_kcal, Some(410));

        let negative = RunEntry {
            distance_km: -1.0,
            ..entry
        };
        assert!(matches!(
            negative.into_record(&model),
            Err(ImportError::InvalidValue { field, .. }) if field == "distance_km"
        ));
    }

    #[test]
    fn test_sample_validation() {
        assert!(validate_sample(LocationSample::new(-23.5, -46.6, 0)).is_ok());
        assert!(validate_sample(LocationSample::new(91.0, 0.0, 0)).is_err());
        assert!(validate_sample(LocationSample::new(0.0, f64::NAN, 0)).is_err());
    }
}
