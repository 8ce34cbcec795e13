use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::ImportError;
use crate::import::{has_extension, parse_error, validate_sample, ImportFormat, RunEntry};
use crate::models::{LocationSample, RunRecord};
use crate::run_stats::CalorieModel;

const FORMAT: &str = "JSON";

/// JSON importer: a top-level array of samples or run entries
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    pub fn samples_from_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<LocationSample>, ImportError> {
        let samples: Vec<LocationSample> =
            serde_json::from_reader(reader).map_err(|e| parse_error(FORMAT, e))?;

        samples.into_iter().map(validate_sample).collect()
    }

    /// Runs carry date, distance and duration; pace and calories are derived
    pub fn runs_from_reader<R: Read>(
        &self,
        reader: R,
        calories: &CalorieModel,
    ) -> Result<Vec<RunRecord>, ImportError> {
        let entries: Vec<RunEntry> =
            serde_json::from_reader(reader).map_err(|e| parse_error(FORMAT, e))?;

        entries
            .into_iter()
            .map(|entry| entry.into_record(calories))
            .collect()
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_samples(&self, file_path: &Path) -> Result<Vec<LocationSample>, ImportError> {
        self.samples_from_reader(BufReader::new(File::open(file_path)?))
    }

    fn import_runs(
        &self,
        file_path: &Path,
        calories: &CalorieModel,
    ) -> Result<Vec<RunRecord>, ImportError> {
        self.runs_from_reader(BufReader::new(File::open(file_path)?), calories)
    }

    fn get_format_name(&self) -> &'static str {
        FORMAT
    }
}
