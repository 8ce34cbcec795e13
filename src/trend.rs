//! Linear trend estimation over per-run metrics
//!
//! Fits an ordinary least-squares line over a series indexed `0..n` and
//! classifies the direction, taking into account metrics where a lower value
//! is better (pace).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::models::RunRecord;

/// Direction of a fitted trend from the athlete's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Flat,
    Worsening,
}

impl TrendDirection {
    fn classify(slope: f64, lower_is_better: bool) -> Self {
        if slope == 0.0 {
            return TrendDirection::Flat;
        }

        let improving = if lower_is_better {
            slope < 0.0
        } else {
            slope > 0.0
        };

        if improving {
            TrendDirection::Improving
        } else {
            TrendDirection::Worsening
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "Improving"),
            TrendDirection::Flat => write!(f, "Flat"),
            TrendDirection::Worsening => write!(f, "Worsening"),
        }
    }
}

/// Least-squares line `y = slope × index + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Change per series index
    pub slope: f64,
    pub intercept: f64,
    pub direction: TrendDirection,
    /// Number of finite points the line was fitted to
    pub points: usize,
}

impl TrendResult {
    fn flat(intercept: f64, points: usize) -> Self {
        Self {
            slope: 0.0,
            intercept,
            direction: TrendDirection::Flat,
            points,
        }
    }

    /// Trendline value at a series index
    pub fn value_at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }

    /// Trendline values for every fitted point, for chart overlays
    pub fn fitted_values(&self) -> Vec<f64> {
        (0..self.points).map(|i| self.value_at(i)).collect()
    }
}

/// Fit a linear trend over `series`.
///
/// Non-finite entries mark missing values: they are dropped and the remaining
/// points keep their relative order. With fewer than two valid points the
/// result is flat with zero slope; a single point becomes the intercept.
pub fn fit_trend(series: &[f64], lower_is_better: bool) -> TrendResult {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();

    let skipped = series.len() - values.len();
    if skipped > 0 {
        debug!(skipped, "Dropped non-finite points before trend fitting");
    }

    match values.as_slice() {
        [] => return TrendResult::flat(0.0, 0),
        [only] => return TrendResult::flat(*only, 1),
        _ => {}
    }

    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    let slope = if denominator.abs() > f64::EPSILON {
        (n * sum_xy - sum_x * sum_y) / denominator
    } else {
        0.0
    };
    let intercept = (sum_y - slope * sum_x) / n;

    if !slope.is_finite() || !intercept.is_finite() {
        warn!(points = values.len(), "Trend fit overflowed, reporting a flat trend");
        return TrendResult::flat(0.0, values.len());
    }

    TrendResult {
        slope,
        intercept,
        direction: TrendDirection::classify(slope, lower_is_better),
        points: values.len(),
    }
}

/// Per-run metric that can be trended across a run history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMetric {
    Distance,
    Duration,
    Pace,
    HeartRate,
}

impl RunMetric {
    /// Whether a falling value means the athlete is getting better
    pub fn lower_is_better(&self) -> bool {
        matches!(self, RunMetric::Pace)
    }

    /// Metric value for a run, `None` when the run has no such value
    pub fn value(&self, record: &RunRecord) -> Option<f64> {
        match self {
            RunMetric::Distance => Some(record.distance_km),
            RunMetric::Duration => Some(record.duration_minutes),
            RunMetric::Pace => record.pace_min_per_km,
            RunMetric::HeartRate => record.avg_heart_rate.map(f64::from),
        }
    }

    /// Unit suffix for display
    pub fn unit(&self) -> &'static str {
        match self {
            RunMetric::Distance => "km",
            RunMetric::Duration => "min",
            RunMetric::Pace => "min/km",
            RunMetric::HeartRate => "bpm",
        }
    }
}

impl FromStr for RunMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "distance" => Ok(RunMetric::Distance),
            "duration" | "time" => Ok(RunMetric::Duration),
            "pace" => Ok(RunMetric::Pace),
            "heart-rate" | "heart_rate" | "hr" => Ok(RunMetric::HeartRate),
            _ => Err(format!("Invalid metric: {}", s)),
        }
    }
}

impl fmt::Display for RunMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMetric::Distance => write!(f, "Distance"),
            RunMetric::Duration => write!(f, "Duration"),
            RunMetric::Pace => write!(f, "Pace"),
            RunMetric::HeartRate => write!(f, "Heart Rate"),
        }
    }
}

/// Fit a trend for `metric` over runs ordered oldest to newest.
///
/// Runs without a value for the metric are skipped.
pub fn metric_trend(records: &[RunRecord], metric: RunMetric) -> TrendResult {
    let mut ordered: Vec<&RunRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.date);

    let series: Vec<f64> = ordered
        .iter()
        .map(|record| metric.value(record).unwrap_or(f64::NAN))
        .collect();

    fit_trend(&series, metric.lower_is_better())
}
