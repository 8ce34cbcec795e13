use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::import::{has_extension, parse_error, validate_sample, ImportFormat};
use crate::models::LocationSample;

const FORMAT: &str = "GPX";

/// GPX importer for recorded GPS tracks
pub struct GpxImporter;

impl GpxImporter {
    pub fn new() -> Self {
        Self
    }

    /// Read every timed track point, in track and segment order.
    ///
    /// Points without a timestamp cannot contribute to elapsed time and are
    /// skipped.
    pub fn samples_from_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<LocationSample>, ImportError> {
        let gpx = gpx::read(reader).map_err(|e| parse_error(FORMAT, e))?;

        let mut samples = Vec::new();
        let mut untimed = 0usize;

        for track in gpx.tracks {
            for segment in track.segments {
                for point in segment.points {
                    let Some(time) = point.time else {
                        untimed += 1;
                        continue;
                    };

                    let iso = time.format().map_err(|e| parse_error(FORMAT, e))?;
                    let utc = DateTime::parse_from_rfc3339(&iso)
                        .map_err(|e| parse_error(FORMAT, e))?
                        .with_timezone(&Utc);

                    let geo = point.point();
                    let sample = LocationSample::new(geo.y(), geo.x(), utc.timestamp_millis());
                    samples.push(validate_sample(sample)?);
                }
            }
        }

        if untimed > 0 {
            warn!(untimed, "Skipped GPX track points without a timestamp");
        }
        debug!(samples = samples.len(), "Parsed GPX track");

        Ok(samples)
    }
}

impl Default for GpxImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for GpxImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "gpx")
    }

    fn import_samples(&self, file_path: &Path) -> Result<Vec<LocationSample>, ImportError> {
        let reader = BufReader::new(File::open(file_path)?);
        self.samples_from_reader(reader)
    }

    fn get_format_name(&self) -> &'static str {
        FORMAT
    }
}
