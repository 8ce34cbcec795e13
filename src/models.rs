use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::run_stats::{pace_min_per_km, CalorieModel};

/// Meters in one kilometer
pub const METERS_PER_KM: f64 = 1000.0;

/// Milliseconds in one minute
pub const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// A single GPS fix reported by the location tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Wall-clock instant in milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
        }
    }

    /// Great-circle distance to another sample in meters
    pub fn distance_to(&self, other: &LocationSample) -> f64 {
        crate::geo::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    /// Timestamp as a UTC datetime, `None` if out of chrono's range
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// A completed run as handed to persistence and the statistics views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Calendar date of the run
    pub date: NaiveDate,

    /// Total distance in kilometers
    pub distance_km: f64,

    /// Elapsed time in minutes
    pub duration_minutes: f64,

    /// Minutes per kilometer; `None` when no distance was covered
    pub pace_min_per_km: Option<f64>,

    /// Estimated energy expenditure; `None` when no distance was covered
    pub calories_kcal: Option<u32>,

    /// Average heart rate, when the athlete recorded one
    #[serde(default)]
    pub avg_heart_rate: Option<u16>,

    /// Recorded GPS track for map replay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<LocationSample>>,
}

impl RunRecord {
    /// Build a record from manually entered totals, deriving pace and calories
    pub fn new(
        date: NaiveDate,
        distance_km: f64,
        duration_minutes: f64,
        calories: &CalorieModel,
    ) -> Self {
        Self {
            date,
            distance_km,
            duration_minutes,
            pace_min_per_km: pace_min_per_km(distance_km, duration_minutes),
            calories_kcal: calories.estimate(distance_km),
            avg_heart_rate: None,
            path: None,
        }
    }

    pub fn with_heart_rate(mut self, avg_heart_rate: Option<u16>) -> Self {
        self.avg_heart_rate = avg_heart_rate;
        self
    }

    /// Replace the estimated calories with a measured value.
    ///
    /// Ignored for zero-distance runs, which never report calories.
    pub fn with_calories(mut self, calories_kcal: u32) -> Self {
        if self.calories_kcal.is_some() {
            self.calories_kcal = Some(calories_kcal);
        }
        self
    }

    pub fn with_path(mut self, path: Vec<LocationSample>) -> Self {
        self.path = Some(path);
        self
    }
}

/// Athlete experience level used to scale default sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AthleteLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for AthleteLevel {
    fn default() -> Self {
        AthleteLevel::Beginner
    }
}

impl FromStr for AthleteLevel {
    type Err = crate::error::PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "iniciante" => Ok(Self::Beginner),
            "intermediate" | "intermediário" | "intermediario" => Ok(Self::Intermediate),
            "advanced" | "avançado" | "avancado" => Ok(Self::Advanced),
            _ => Err(crate::error::PlanError::UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for AthleteLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AthleteLevel::Beginner => write!(f, "Beginner"),
            AthleteLevel::Intermediate => write!(f, "Intermediate"),
            AthleteLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Workout character of a planned session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    LightRun,
    Interval,
    Tempo,
    LongRun,
    RegularRun,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::LightRun => write!(f, "Light Run"),
            SessionType::Interval => write!(f, "Interval"),
            SessionType::Tempo => write!(f, "Tempo"),
            SessionType::LongRun => write!(f, "Long Run"),
            SessionType::RegularRun => write!(f, "Regular Run"),
        }
    }
}

/// Effort level of a planned session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intensity {
    Light,
    Moderate,
    High,
}

impl FromStr for Intensity {
    type Err = crate::error::PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" | "leve" => Ok(Self::Light),
            "moderate" | "moderada" => Ok(Self::Moderate),
            "high" | "alta" => Ok(Self::High),
            _ => Err(crate::error::PlanError::UnknownIntensity(s.to_string())),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Light => write!(f, "Light"),
            Intensity::Moderate => write!(f, "Moderate"),
            Intensity::High => write!(f, "High"),
        }
    }
}
