//! Run statistics from GPS samples
//!
//! Converts an ordered sequence of [`LocationSample`]s into distance, elapsed
//! time, pace and calorie estimates. Two entry points produce identical
//! numbers:
//!
//! - [`compute_stats`] recomputes everything from a snapshot of the samples
//! - [`RunStatsAccumulator`] carries running totals so a live tracking loop can
//!   feed one sample at a time without re-walking the whole track
//!
//! Both sum the pairwise segment distances in sample order starting from zero,
//! so their results are bit-for-bit equal for any sample sequence.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{LocationSample, RunRecord, METERS_PER_KM, MILLIS_PER_MINUTE};

/// Calories burned per kilometer by the reference runner
pub const DEFAULT_KCAL_PER_KM: f64 = 65.0;

/// Body weight the default per-kilometer constant was calibrated for
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;

/// Linear calorie model: kcal = distance_km × kcal_per_km
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalorieModel {
    pub kcal_per_km: f64,
}

impl Default for CalorieModel {
    fn default() -> Self {
        Self {
            kcal_per_km: DEFAULT_KCAL_PER_KM,
        }
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl CalorieModel {
    /// Model with a fixed per-kilometer constant.
    ///
    /// A constant that is not a positive finite number is replaced by
    /// [`DEFAULT_KCAL_PER_KM`], so a covered distance always has an estimate.
    pub fn new(kcal_per_km: f64) -> Self {
        if !is_positive_finite(kcal_per_km) {
            warn!(kcal_per_km, "Ignoring invalid calorie constant, using the default");
            return Self::default();
        }

        Self { kcal_per_km }
    }

    /// Scale the default constant to the athlete's body weight
    pub fn for_body_weight(weight_kg: f64) -> Self {
        Self::scaled(DEFAULT_KCAL_PER_KM, REFERENCE_WEIGHT_KG, weight_kg)
    }

    /// Scale `kcal_per_km` calibrated at `reference_weight_kg` to `weight_kg`.
    ///
    /// Falls back to the unscaled constant when either weight is not a
    /// positive finite number. An invalid constant is replaced by the default
    /// one, which is then scaled from [`REFERENCE_WEIGHT_KG`].
    pub fn scaled(kcal_per_km: f64, reference_weight_kg: f64, weight_kg: f64) -> Self {
        if !is_positive_finite(kcal_per_km) {
            warn!(kcal_per_km, "Ignoring invalid calorie constant, using the default");
            return Self::for_body_weight(weight_kg);
        }
        if !is_positive_finite(reference_weight_kg) || !is_positive_finite(weight_kg) {
            warn!(
                reference_weight_kg,
                weight_kg, "Ignoring invalid weight for calorie model"
            );
            return Self::new(kcal_per_km);
        }

        Self::new(kcal_per_km * weight_kg / reference_weight_kg)
    }

    /// Estimated kcal for a distance, `None` when no distance was covered
    pub fn estimate(&self, distance_km: f64) -> Option<u32> {
        if !(distance_km > 0.0) {
            return None;
        }

        let kcal = (distance_km * self.kcal_per_km).round();
        if kcal.is_finite() && kcal >= 0.0 {
            Some(kcal.min(u32::MAX as f64) as u32)
        } else {
            None
        }
    }
}

/// Pace in minutes per kilometer, `None` when the distance is zero
pub fn pace_min_per_km(distance_km: f64, duration_minutes: f64) -> Option<f64> {
    if !(distance_km > 0.0) {
        return None;
    }

    let pace = duration_minutes / distance_km;
    pace.is_finite().then_some(pace)
}

/// Live statistics for a run in progress or just finished
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub pace_min_per_km: Option<f64>,
    pub calories_kcal: Option<u32>,
}

fn summarize(total_meters: f64, first_ms: i64, last_ms: i64, calories: &CalorieModel) -> RunStats {
    let distance_km = total_meters / METERS_PER_KM;
    // Out-of-order timestamps must not produce a negative duration
    let elapsed_ms = last_ms.saturating_sub(first_ms).max(0);
    let duration_minutes = elapsed_ms as f64 / MILLIS_PER_MINUTE;

    RunStats {
        distance_km,
        duration_minutes,
        pace_min_per_km: pace_min_per_km(distance_km, duration_minutes),
        calories_kcal: calories.estimate(distance_km),
    }
}

/// Compute run statistics from the full list of samples recorded so far.
///
/// Fewer than two samples yield zero distance and duration with pace and
/// calories unavailable.
pub fn compute_stats(samples: &[LocationSample], calories: &CalorieModel) -> RunStats {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if samples.len() >= 2 => (first, last),
        _ => return RunStats::default(),
    };

    let total_meters = samples
        .windows(2)
        .fold(0.0, |acc, pair| acc + pair[0].distance_to(&pair[1]));

    let stats = summarize(total_meters, first.timestamp_ms, last.timestamp_ms, calories);
    debug!(
        samples = samples.len(),
        distance_km = stats.distance_km,
        duration_minutes = stats.duration_minutes,
        "Computed run stats"
    );
    stats
}

/// Incremental run statistics for a live tracking loop
#[derive(Debug, Clone, Default)]
pub struct RunStatsAccumulator {
    calories: CalorieModel,
    first: Option<LocationSample>,
    last: Option<LocationSample>,
    total_meters: f64,
    sample_count: usize,
    path: Option<Vec<LocationSample>>,
}

impl RunStatsAccumulator {
    /// Accumulator that keeps only running totals
    pub fn new(calories: CalorieModel) -> Self {
        Self {
            calories,
            ..Self::default()
        }
    }

    /// Accumulator that also retains every sample for map replay
    pub fn with_path(calories: CalorieModel) -> Self {
        Self {
            calories,
            path: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Add the next sample and return the updated statistics
    pub fn push(&mut self, sample: LocationSample) -> RunStats {
        match self.last {
            Some(last) => {
                if sample.timestamp_ms < last.timestamp_ms {
                    warn!(
                        previous_ms = last.timestamp_ms,
                        current_ms = sample.timestamp_ms,
                        "Location sample arrived out of order"
                    );
                }
                self.total_meters += last.distance_to(&sample);
            }
            None => self.first = Some(sample),
        }

        self.last = Some(sample);
        self.sample_count += 1;
        if let Some(path) = self.path.as_mut() {
            path.push(sample);
        }

        self.stats()
    }

    /// Current statistics without adding a sample
    pub fn stats(&self) -> RunStats {
        match (self.first, self.last) {
            (Some(first), Some(last)) if self.sample_count >= 2 => summarize(
                self.total_meters,
                first.timestamp_ms,
                last.timestamp_ms,
                &self.calories,
            ),
            _ => RunStats::default(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Close the run and produce its record.
    ///
    /// Returns `None` when fewer than two samples were recorded, since such a
    /// run is too short to keep, or when the first timestamp lies outside the
    /// calendar range chrono can represent.
    pub fn finish(self) -> Option<RunRecord> {
        if self.sample_count < 2 {
            debug!(samples = self.sample_count, "Discarding run that is too short");
            return None;
        }

        let stats = self.stats();
        let first = self.first?;
        let Some(started) = first.datetime() else {
            warn!(
                timestamp_ms = first.timestamp_ms,
                "Discarding run whose start time is out of range"
            );
            return None;
        };
        let date = started.date_naive();

        Some(RunRecord {
            date,
            distance_km: stats.distance_km,
            duration_minutes: stats.duration_minutes,
            pace_min_per_km: stats.pace_min_per_km,
            calories_kcal: stats.calories_kcal,
            avg_heart_rate: None,
            path: self.path,
        })
    }
}

impl RunRecord {
    /// Build the record for a finished run from its full sample list.
    ///
    /// The path is kept on the record. Returns `None` for runs with fewer
    /// than two samples.
    pub fn from_samples(samples: &[LocationSample], calories: &CalorieModel) -> Option<RunRecord> {
        let mut accumulator = RunStatsAccumulator::with_path(*calories);
        for sample in samples {
            accumulator.push(*sample);
        }
        accumulator.finish()
    }
}
