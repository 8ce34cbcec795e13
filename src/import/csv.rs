use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::ImportError;
use crate::import::{has_extension, parse_error, validate_sample, ImportFormat, RunEntry};
use crate::models::{LocationSample, RunRecord};
use crate::run_stats::CalorieModel;

const FORMAT: &str = "CSV";

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Track columns
        Self::add_mapping(&mut column_mapping, "latitude", &["latitude", "lat"]);
        Self::add_mapping(
            &mut column_mapping,
            "longitude",
            &["longitude", "lon", "lng", "long"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "timestamp",
            &["timestamp", "time", "timestamp_ms"],
        );

        // Run history columns
        Self::add_mapping(&mut column_mapping, "date", &["date", "day"]);
        Self::add_mapping(
            &mut column_mapping,
            "distance_km",
            &["distance_km", "distance", "km"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration_minutes",
            &["duration_minutes", "duration", "minutes"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "avg_heart_rate",
            &["avg_heart_rate", "heart_rate", "hr", "bpm"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "calories_kcal",
            &["calories_kcal", "calories", "kcal"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Standard column name -> index; the first matching header wins
    fn column_indices(&self, headers: &StringRecord) -> HashMap<String, usize> {
        let mut indices = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            indices.entry(self.normalize_column_name(header)).or_insert(i);
        }
        indices
    }

    /// Parse a timestamp as epoch milliseconds, RFC 3339, or a UTC date-time
    fn parse_timestamp_ms(value: &str) -> Result<i64, ImportError> {
        if let Ok(millis) = value.parse::<i64>() {
            return Ok(millis);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(dt.timestamp_millis());
        }

        let formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];
        for format in &formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(naive_dt.and_utc().timestamp_millis());
            }
        }

        Err(invalid("timestamp", value))
    }

    fn parse_date(value: &str) -> Result<NaiveDate, ImportError> {
        ["%Y-%m-%d", "%d/%m/%Y"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
            .ok_or_else(|| invalid("date", value))
    }

    /// Read location samples from CSV text
    pub fn samples_from_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<LocationSample>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(|e| parse_error(FORMAT, e))?.clone();
        let columns = Columns::new(self.column_indices(&headers));
        let latitude = columns.require("latitude")?;
        let longitude = columns.require("longitude")?;
        let timestamp = columns.require("timestamp")?;

        let mut samples = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| parse_error(FORMAT, e))?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }

            let sample = LocationSample::new(
                parse_f64("latitude", field(&record, latitude))?,
                parse_f64("longitude", field(&record, longitude))?,
                Self::parse_timestamp_ms(field(&record, timestamp))?,
            );
            samples.push(validate_sample(sample)?);
        }

        debug!(samples = samples.len(), "Parsed CSV track");
        Ok(samples)
    }

    /// Read run records from CSV text, deriving pace and calories
    pub fn runs_from_reader<R: Read>(
        &self,
        reader: R,
        calories: &CalorieModel,
    ) -> Result<Vec<RunRecord>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(|e| parse_error(FORMAT, e))?.clone();
        let columns = Columns::new(self.column_indices(&headers));
        let date = columns.require("date")?;
        let distance = columns.require("distance_km")?;
        let duration = columns.require("duration_minutes")?;
        let heart_rate = columns.optional("avg_heart_rate");
        let measured_calories = columns.optional("calories_kcal");

        let mut runs = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| parse_error(FORMAT, e))?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }

            let entry = RunEntry {
                date: Self::parse_date(field(&record, date))?,
                distance_km: parse_f64("distance_km", field(&record, distance))?,
                duration_minutes: parse_f64("duration_minutes", field(&record, duration))?,
                avg_heart_rate: parse_optional("avg_heart_rate", &record, heart_rate)?,
                calories_kcal: parse_optional("calories_kcal", &record, measured_calories)?,
            };
            runs.push(entry.into_record(calories)?);
        }

        debug!(runs = runs.len(), "Parsed CSV run history");
        Ok(runs)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_samples(&self, file_path: &Path) -> Result<Vec<LocationSample>, ImportError> {
        self.samples_from_reader(File::open(file_path)?)
    }

    fn import_runs(
        &self,
        file_path: &Path,
        calories: &CalorieModel,
    ) -> Result<Vec<RunRecord>, ImportError> {
        self.runs_from_reader(File::open(file_path)?, calories)
    }

    fn get_format_name(&self) -> &'static str {
        FORMAT
    }
}

/// Header lookup for one CSV file
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(indices: HashMap<String, usize>) -> Self {
        Self(indices)
    }

    fn require(&self, column: &str) -> Result<usize, ImportError> {
        self.optional(column).ok_or_else(|| ImportError::MissingColumn {
            column: column.to_string(),
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.0.get(column).copied()
    }
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

fn invalid(field: &str, value: &str) -> ImportError {
    ImportError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_f64(name: &str, value: &str) -> Result<f64, ImportError> {
    value.parse::<f64>().map_err(|_| invalid(name, value))
}

/// Empty cells and absent columns both read as `None`
fn parse_optional<T: std::str::FromStr>(
    name: &str,
    record: &StringRecord,
    index: Option<usize>,
) -> Result<Option<T>, ImportError> {
    match index.map(|i| field(record, i)) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| invalid(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_aliases() {
        let importer = CsvImporter::new();

        assert_eq!(importer.normalize_column_name("Lat"), "latitude");
        assert_eq!(importer.normalize_column_name("lng"), "longitude");
        assert_eq!(importer.normalize_column_name("Timestamp-MS"), "timestamp");
        assert_eq!(importer.normalize_column_name("Heart Rate"), "avg_heart_rate");
        assert_eq!(importer.normalize_column_name("elevation"), "elevation");
    }

    #[test]
    fn test_samples_from_csv() {
        let data = "\
lat,lng,time
-23.5505,-46.6333,1700000000000
-23.5510,-46.6340,2024-01-15T07:00:30Z

-23.5520,-46.6350,2024-01-15 07:01:00
";
        let samples = CsvImporter::new()
            .samples_from_reader(data.as_bytes())
            .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(samples[1].timestamp_ms, 1_705_302_030_000);
        assert_eq!(samples[2].timestamp_ms - samples[1].timestamp_ms, 30_000);
        assert_eq!(samples[2].longitude, -46.635);
    }

    #[test]
    fn test_missing_column() {
        let data = "latitude,timestamp\n1.0,0\n";
        let result = CsvImporter::new().samples_from_reader(data.as_bytes());

        assert!(matches!(
            result,
            Err(ImportError::MissingColumn { column }) if column == "longitude"
        ));
    }

    #[test]
    fn test_invalid_coordinate() {
        let data = "latitude,longitude,timestamp\nnorth,0.0,0\n";
        let result = CsvImporter::new().samples_from_reader(data.as_bytes());

        assert!(matches!(
            result,
            Err(ImportError::InvalidValue { field, value }) if field == "latitude" && value == "north"
        ));
    }

    #[test]
    fn test_runs_from_csv() {
        let data = "\
date,distance,duration,hr
2024-01-10,5.0,30,150
15/02/2024,0,12,
2024-02-20,10,55,
";
        let runs = CsvImporter::new()
            .runs_from_reader(data.as_bytes(), &CalorieModel::default())
            .unwrap();

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].pace_min_per_km, Some(6.0));
        assert_eq!(runs[0].avg_heart_rate, Some(150));
        assert_eq!(runs[1].date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(runs[1].pace_min_per_km, None);
        assert_eq!(runs[1].calories_kcal, None);
        assert_eq!(runs[2].calories_kcal, Some(650));
    }

    #[test]
    fn test_runs_reject_negative_duration() {
        let data = "date,distance_km,duration_minutes\n2024-01-10,5.0,-3\n";
        let result = CsvImporter::new().runs_from_reader(data.as_bytes(), &CalorieModel::default());

        assert!(matches!(
            result,
            Err(ImportError::InvalidValue { field, .. }) if field == "duration_minutes"
        ));
    }
}
