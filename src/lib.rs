// Library interface for LazzFit modules
// This allows the CLI, integration tests and benches to share the engine

pub mod aggregate;
pub mod config;
pub mod error;
pub mod geo;
pub mod import;
pub mod logging;
pub mod models;
pub mod run_stats;
pub mod training_plan;
pub mod trend;

// Re-export commonly used types for convenience
pub use aggregate::{
    aggregate, filter_by_period, AggregateStats, AggregateStatsCalculator, MonthKey, MonthLabels,
    MonthlySummary, Period,
};
pub use error::{ImportError, LazzFitError, PlanError, Result};
pub use geo::haversine_distance;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use run_stats::{compute_stats, CalorieModel, RunStats, RunStatsAccumulator};
pub use training_plan::{
    PlanRequest, PlannedSession, SessionPlanGenerator, SessionTemplate, TrainingPlan,
    TrainingPlanGenerator,
};
pub use trend::{fit_trend, metric_trend, RunMetric, TrendDirection, TrendResult};
