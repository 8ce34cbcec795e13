use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, error, info, warn};

use lazzfit::aggregate::{filter_by_period, AggregateStatsCalculator, MonthLabels, Period};
use lazzfit::config::AppConfig;
use lazzfit::error::{ErrorSeverity, LazzFitError};
use lazzfit::import::ImportManager;
use lazzfit::logging::init_logging;
use lazzfit::models::{AthleteLevel, RunRecord};
use lazzfit::run_stats::{CalorieModel, RunStatsAccumulator};
use lazzfit::training_plan::{PlanRequest, TrainingPlanGenerator};
use lazzfit::trend::{metric_trend, RunMetric, TrendDirection};

/// LazzFit - Run Tracking Statistics CLI
///
/// Computes live run statistics from GPS tracks, summarizes run histories,
/// estimates trends and scaffolds training plans.
#[derive(Parser)]
#[command(name = "lazzfit")]
#[command(version)]
#[command(about = "Run tracking statistics CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded track and report its run statistics
    Track {
        /// Track file (GPX, CSV or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Keep the sample path on the resulting run record
        #[arg(long)]
        keep_path: bool,
    },

    /// Summarize a run history
    Stats {
        /// Run history file (CSV or JSON)
        #[arg(short, long)]
        runs: PathBuf,

        /// Time window: week, month, year or all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Reference date for the period (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Month label language (english, portuguese)
        #[arg(long)]
        labels: Option<MonthLabels>,
    },

    /// Fit a linear trend over a run metric
    Trend {
        /// Run history file (CSV or JSON)
        #[arg(short, long)]
        runs: PathBuf,

        /// Metric: distance, duration, pace or heart-rate
        #[arg(short, long, default_value = "pace")]
        metric: RunMetric,
    },

    /// Generate a training plan with default sessions
    Plan {
        /// Athlete level (default from config)
        #[arg(short, long)]
        level: Option<AthleteLevel>,

        /// Plan length in weeks
        #[arg(short, long, default_value = "4")]
        weeks: u32,

        /// Training days of the week, 1-7
        #[arg(short, long, value_delimiter = ',', default_value = "1,3,5,6")]
        days: Vec<u8>,

        /// Plan name
        #[arg(short, long, default_value = "Training Plan")]
        name: String,

        /// Plan goal, e.g. "10K"
        #[arg(short, long)]
        goal: Option<String>,
    },
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl MetricRow {
    fn new(metric: &str, value: String) -> Self {
        Self {
            metric: metric.to_string(),
            value,
        }
    }
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    label: String,
    #[tabled(rename = "Runs")]
    count: usize,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Session")]
    id: String,
    #[tabled(rename = "Type")]
    session_type: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref());
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    let calories = config.calorie_model();
    debug!(kcal_per_km = calories.kcal_per_km, "Using calorie model");

    let result = match cli.command {
        Commands::Track { file, keep_path } => track(&file, keep_path, &calories, cli.json),
        Commands::Stats {
            runs,
            period,
            as_of,
            labels,
        } => {
            let labels = labels.unwrap_or(config.display.month_labels);
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            stats(&runs, period, as_of, labels, &calories, cli.json)
        }
        Commands::Trend { runs, metric } => trend(&runs, metric, &calories, cli.json),
        Commands::Plan {
            level,
            weeks,
            days,
            name,
            goal,
        } => {
            let request = PlanRequest {
                name,
                goal,
                level: level.unwrap_or(config.athlete.level),
                duration_weeks: weeks,
                training_days: days.into_iter().collect::<BTreeSet<u8>>(),
            };
            plan(&request, cli.json)
        }
    };

    if let Err(e) = &result {
        if let Some(known) = e.downcast_ref::<LazzFitError>() {
            match known.severity() {
                ErrorSeverity::Warning => warn!(error = %e, "Command failed"),
                ErrorSeverity::Error | ErrorSeverity::Critical => {
                    error!(error = %e, "Command failed")
                }
            }
            eprintln!("{} {}", "✗".red().bold(), known.user_message());
            std::process::exit(1);
        }
    }

    result
}

fn track(file: &Path, keep_path: bool, calories: &CalorieModel, json: bool) -> Result<()> {
    let samples = ImportManager::new()
        .import_samples(file)
        .map_err(LazzFitError::from)?;

    let mut accumulator = if keep_path {
        RunStatsAccumulator::with_path(*calories)
    } else {
        RunStatsAccumulator::new(*calories)
    };
    for sample in samples {
        let live = accumulator.push(sample);
        debug!(
            samples = accumulator.sample_count(),
            distance_km = live.distance_km,
            duration_minutes = live.duration_minutes,
            "Live stats"
        );
    }

    let sample_count = accumulator.sample_count();
    let record = accumulator.finish().with_context(|| {
        if sample_count < 2 {
            format!("{} is too short to form a run", file.display())
        } else {
            format!("{} starts at a time outside the supported range", file.display())
        }
    })?;
    info!(distance_km = record.distance_km, "Run finished");

    if json {
        return print_json(&record);
    }

    println!("{}", "Run summary".green().bold());
    let rows = vec![
        MetricRow::new("Date", record.date.to_string()),
        MetricRow::new("Distance", format!("{:.2} km", record.distance_km)),
        MetricRow::new("Duration", format_minutes(record.duration_minutes)),
        MetricRow::new("Pace", format_optional_pace(record.pace_min_per_km)),
        MetricRow::new(
            "Calories",
            record
                .calories_kcal
                .map(|kcal| format!("{} kcal", kcal))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    Ok(())
}

fn load_runs(file: &Path, calories: &CalorieModel) -> Result<Vec<RunRecord>> {
    ImportManager::new()
        .import_runs(file, calories)
        .map_err(LazzFitError::from)
        .with_context(|| format!("Failed to load runs from {}", file.display()))
}

fn stats(
    file: &Path,
    period: Period,
    as_of: NaiveDate,
    labels: MonthLabels,
    calories: &CalorieModel,
    json: bool,
) -> Result<()> {
    let runs = load_runs(file, calories)?;
    let selected = filter_by_period(&runs, period, as_of);
    info!(total = runs.len(), selected = selected.len(), ?period, "Aggregating runs");

    let summary = AggregateStatsCalculator::with_labels(labels).aggregate(selected);

    if json {
        return print_json(&summary);
    }

    println!(
        "{}",
        format!("Run statistics ({:?}, as of {})", period, as_of).blue().bold()
    );
    let rows = vec![
        MetricRow::new("Runs", summary.total_runs.to_string()),
        MetricRow::new("Distance", format!("{:.2} km", summary.total_distance_km)),
        MetricRow::new("Time", format_minutes(summary.total_duration_minutes)),
        MetricRow::new("Average pace", format_optional_pace(summary.average_pace_min_per_km)),
        MetricRow::new("Calories", format!("{} kcal", summary.total_calories_kcal)),
        MetricRow::new(
            "Longest run",
            summary
                .longest_run_km
                .map(|km| format!("{:.2} km", km))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    if !summary.per_month.is_empty() {
        println!("{}", "By month".blue().bold());
        let months = summary.per_month.iter().map(|month| MonthRow {
            label: month.label.clone(),
            count: month.count,
            distance: format!("{:.2} km", month.distance_km),
            duration: format_minutes(month.duration_minutes),
        });
        println!("{}", Table::new(months).with(Style::rounded()));
    }

    Ok(())
}

fn trend(file: &Path, metric: RunMetric, calories: &CalorieModel, json: bool) -> Result<()> {
    let runs = load_runs(file, calories)?;
    let result = metric_trend(&runs, metric);

    if json {
        return print_json(&result);
    }

    let direction = match result.direction {
        TrendDirection::Improving => result.direction.to_string().green(),
        TrendDirection::Flat => result.direction.to_string().yellow(),
        TrendDirection::Worsening => result.direction.to_string().red(),
    };

    println!("{}", format!("{} trend", metric).cyan().bold());
    let rows = vec![
        MetricRow::new("Runs fitted", result.points.to_string()),
        MetricRow::new(
            "Slope",
            format!("{:+.3} {} per run", result.slope, metric.unit()),
        ),
        MetricRow::new("Intercept", format!("{:.3} {}", result.intercept, metric.unit())),
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("Direction: {}", direction.bold());

    Ok(())
}

fn plan(request: &PlanRequest, json: bool) -> Result<()> {
    let plan = TrainingPlanGenerator::generate(request).map_err(LazzFitError::from)?;

    if json {
        return print_json(&plan);
    }

    println!(
        "{}",
        format!(
            "{} ({}, {} weeks)",
            plan.name, plan.level, plan.duration_weeks
        )
        .magenta()
        .bold()
    );
    if let Some(goal) = &plan.goal {
        println!("Goal: {}", goal);
    }

    let rows = plan.sessions.iter().map(|session| SessionRow {
        id: session.id.clone(),
        session_type: session.template.session_type.to_string(),
        distance: format!("{} km", session.template.distance_km),
        duration: format!("{} min", session.template.duration_minutes),
        intensity: session.template.intensity.to_string(),
    });
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!(
        "Total: {} km over {} min",
        plan.total_distance_km, plan.total_duration_minutes
    );

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Minutes as `h:mm:ss` or `mm:ss`
fn format_minutes(minutes: f64) -> String {
    let total_seconds = (minutes * 60.0).round() as i64;
    let (hours, rest) = (total_seconds / 3600, total_seconds % 3600);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, rest / 60, rest % 60)
    } else {
        format!("{:02}:{:02}", rest / 60, rest % 60)
    }
}

fn format_optional_pace(pace: Option<f64>) -> String {
    match pace {
        Some(pace) => format!("{} /km", format_minutes(pace)),
        None => "-".to_string(),
    }
}
