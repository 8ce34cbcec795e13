//! Aggregate statistics over completed runs
//!
//! Totals, averages and calendar-month grouping for the dashboard and
//! statistics views. Results are recomputed on demand and never cached;
//! iteration order is deterministic so repeated calls are bit-identical.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::models::RunRecord;
use crate::run_stats::pace_min_per_km;

const ENGLISH_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const PORTUGUESE_MONTHS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Language used for month abbreviations in monthly labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthLabels {
    #[default]
    English,
    Portuguese,
}

impl MonthLabels {
    /// Abbreviation for a 1-based month number
    pub fn abbreviation(&self, month: u32) -> &'static str {
        let names = match self {
            MonthLabels::English => &ENGLISH_MONTHS,
            MonthLabels::Portuguese => &PORTUGUESE_MONTHS,
        };
        let index = (month.clamp(1, 12) - 1) as usize;
        names[index]
    }
}

impl FromStr for MonthLabels {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(MonthLabels::English),
            "pt" | "pt-br" | "portuguese" => Ok(MonthLabels::Portuguese),
            _ => Err(format!("Invalid month label language: {}", s)),
        }
    }
}

/// Calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Display label such as `Jan/2024`
    pub fn label(&self, labels: MonthLabels) -> String {
        format!("{}/{}", labels.abbreviation(self.month), self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub label: String,
    pub count: usize,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// Fleet-level statistics over a collection of runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_runs: usize,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,

    /// Total duration over total distance; `None` when no distance was run
    pub average_pace_min_per_km: Option<f64>,

    /// Sum of the calories reported by each run
    pub total_calories_kcal: u64,

    /// Longest single run
    pub longest_run_km: Option<f64>,

    /// Mean distance per run
    pub average_distance_km: Option<f64>,

    /// Mean duration per run
    pub average_duration_minutes: Option<f64>,

    /// Monthly totals, newest month first
    pub per_month: Vec<MonthlySummary>,
}

/// Time window used by the dashboard period toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The seven days ending on the reference date
    Week,
    /// The calendar month of the reference date
    Month,
    /// The calendar year of the reference date
    Year,
    #[default]
    All,
}

impl Period {
    /// Whether `date` falls inside this period relative to `as_of`.
    ///
    /// Bounded periods never include dates after `as_of`.
    pub fn contains(&self, date: NaiveDate, as_of: NaiveDate) -> bool {
        match self {
            Period::All => true,
            _ if date > as_of => false,
            Period::Week => as_of
                .checked_sub_signed(Duration::days(7))
                .map_or(true, |start| date > start),
            Period::Month => date.year() == as_of.year() && date.month() == as_of.month(),
            Period::Year => date.year() == as_of.year(),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}

/// Records whose date falls inside `period` relative to `as_of`, in input order
pub fn filter_by_period(records: &[RunRecord], period: Period, as_of: NaiveDate) -> Vec<&RunRecord> {
    records
        .iter()
        .filter(|record| period.contains(record.date, as_of))
        .collect()
}

#[derive(Debug, Default)]
struct MonthTotals {
    count: usize,
    distance_km: f64,
    duration_minutes: f64,
}

/// Aggregate statistics calculator
#[derive(Debug, Clone, Default)]
pub struct AggregateStatsCalculator {
    labels: MonthLabels,
}

impl AggregateStatsCalculator {
    /// Calculator with English month labels
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(labels: MonthLabels) -> Self {
        Self { labels }
    }

    /// Aggregate a collection of runs
    pub fn aggregate<'a, I>(&self, records: I) -> AggregateStats
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        let mut total_runs = 0usize;
        let mut total_distance_km = 0.0;
        let mut total_duration_minutes = 0.0;
        let mut total_calories_kcal = 0u64;
        let mut longest_run_km: Option<f64> = None;
        let mut months: BTreeMap<MonthKey, MonthTotals> = BTreeMap::new();

        for record in records {
            total_runs += 1;
            total_distance_km += record.distance_km;
            total_duration_minutes += record.duration_minutes;
            total_calories_kcal += u64::from(record.calories_kcal.unwrap_or(0));

            if longest_run_km.map_or(true, |longest| record.distance_km > longest) {
                longest_run_km = Some(record.distance_km);
            }

            let month = months.entry(MonthKey::from_date(record.date)).or_default();
            month.count += 1;
            month.distance_km += record.distance_km;
            month.duration_minutes += record.duration_minutes;
        }

        let per_run = |total: f64| (total_runs > 0).then(|| total / total_runs as f64);

        let per_month = months
            .into_iter()
            .rev()
            .map(|(month, totals)| MonthlySummary {
                month,
                label: month.label(self.labels),
                count: totals.count,
                distance_km: totals.distance_km,
                duration_minutes: totals.duration_minutes,
            })
            .collect::<Vec<_>>();

        debug!(
            total_runs,
            months = per_month.len(),
            total_distance_km,
            "Aggregated run statistics"
        );

        AggregateStats {
            total_runs,
            total_distance_km,
            total_duration_minutes,
            average_pace_min_per_km: pace_min_per_km(total_distance_km, total_duration_minutes),
            total_calories_kcal,
            longest_run_km,
            average_distance_km: per_run(total_distance_km),
            average_duration_minutes: per_run(total_duration_minutes),
            per_month,
        }
    }
}

/// Aggregate with English month labels
pub fn aggregate(records: &[RunRecord]) -> AggregateStats {
    AggregateStatsCalculator::new().aggregate(records)
}
