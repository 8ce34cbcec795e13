use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::PlanError;
use crate::models::{AthleteLevel, Intensity, SessionType};

/// Baseline session volume for an athlete level: (distance km, duration minutes)
///
/// Intermediate and Advanced keep the 5:3 and 7:3 ratios to Beginner.
fn level_baseline(level: AthleteLevel) -> (Decimal, Decimal) {
    match level {
        AthleteLevel::Beginner => (dec!(3), dec!(20)),
        AthleteLevel::Intermediate => (dec!(5), dec!(30)),
        AthleteLevel::Advanced => (dec!(7), dec!(40)),
    }
}

/// Workout character of a weekday
struct DayProfile {
    session_type: SessionType,
    distance_factor: Decimal,
    duration_factor: Decimal,
    intensity: Intensity,
}

fn day_profile(day_of_week: u8) -> DayProfile {
    let (session_type, distance_factor, duration_factor, intensity) = match day_of_week {
        1 => (SessionType::LightRun, dec!(1.0), dec!(1.0), Intensity::Light),
        3 => (SessionType::Interval, dec!(1.2), dec!(1.5), Intensity::High),
        5 => (SessionType::Tempo, dec!(1.1), dec!(1.2), Intensity::Moderate),
        6 => (SessionType::LongRun, dec!(2.0), dec!(2.0), Intensity::Moderate),
        _ => (SessionType::RegularRun, dec!(1.0), dec!(1.0), Intensity::Light),
    };

    DayProfile {
        session_type,
        distance_factor,
        duration_factor,
        intensity,
    }
}

/// Default parameters for one training session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub session_type: SessionType,
    pub distance_km: Decimal,
    pub duration_minutes: Decimal,
    pub intensity: Intensity,
}

impl SessionTemplate {
    /// Short human-readable summary, e.g. `Interval: 3.6 km in 30 min (High)`
    pub fn describe(&self) -> String {
        format!(
            "{}: {} km in {} min ({})",
            self.session_type, self.distance_km, self.duration_minutes, self.intensity
        )
    }
}

/// Default session generator for training-plan scaffolding
pub struct SessionPlanGenerator;

impl SessionPlanGenerator {
    /// Default session for a weekday (1-7) at the given athlete level
    pub fn default_session(
        day_of_week: u8,
        level: AthleteLevel,
    ) -> Result<SessionTemplate, PlanError> {
        if !(1..=7).contains(&day_of_week) {
            return Err(PlanError::InvalidDay(day_of_week));
        }

        let (base_distance, base_duration) = level_baseline(level);
        let profile = day_profile(day_of_week);

        Ok(SessionTemplate {
            session_type: profile.session_type,
            distance_km: (base_distance * profile.distance_factor).normalize(),
            duration_minutes: (base_duration * profile.duration_factor).normalize(),
            intensity: profile.intensity,
        })
    }
}

/// Parameters for scaffolding a multi-week plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub name: String,
    pub goal: Option<String>,
    pub level: AthleteLevel,
    pub duration_weeks: u32,
    /// Selected weekdays, 1-7
    pub training_days: BTreeSet<u8>,
}

/// A session placed in a specific week of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSession {
    /// Stable identifier of the form `week{w}-day{d}`
    pub id: String,
    pub week: u32,
    pub day: u8,
    #[serde(flatten)]
    pub template: SessionTemplate,
    pub description: String,
}

/// Editable training plan pre-populated with default sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub name: String,
    pub goal: Option<String>,
    pub level: AthleteLevel,
    pub duration_weeks: u32,
    pub training_days: Vec<u8>,
    pub sessions: Vec<PlannedSession>,
    pub total_distance_km: Decimal,
    pub total_duration_minutes: Decimal,
}

impl TrainingPlan {
    /// Sessions scheduled in one week, in weekday order
    pub fn sessions_for_week(&self, week: u32) -> Vec<&PlannedSession> {
        self.sessions.iter().filter(|s| s.week == week).collect()
    }
}

/// Training plan generator
pub struct TrainingPlanGenerator;

impl TrainingPlanGenerator {
    /// Generate a plan with one default session per selected day of every week
    pub fn generate(request: &PlanRequest) -> Result<TrainingPlan, PlanError> {
        Self::validate(request)?;

        let mut sessions =
            Vec::with_capacity(request.duration_weeks as usize * request.training_days.len());
        for week in 1..=request.duration_weeks {
            for &day in &request.training_days {
                let template = SessionPlanGenerator::default_session(day, request.level)?;
                sessions.push(PlannedSession {
                    id: format!("week{}-day{}", week, day),
                    week,
                    day,
                    description: template.describe(),
                    template,
                });
            }
        }

        let total_distance_km = sessions.iter().map(|s| s.template.distance_km).sum::<Decimal>();
        let total_duration_minutes = sessions
            .iter()
            .map(|s| s.template.duration_minutes)
            .sum::<Decimal>();

        debug!(
            plan = %request.name,
            weeks = request.duration_weeks,
            sessions = sessions.len(),
            "Generated training plan"
        );

        Ok(TrainingPlan {
            name: request.name.clone(),
            goal: request.goal.clone(),
            level: request.level,
            duration_weeks: request.duration_weeks,
            training_days: request.training_days.iter().copied().collect(),
            sessions,
            total_distance_km: total_distance_km.normalize(),
            total_duration_minutes: total_duration_minutes.normalize(),
        })
    }

    fn validate(request: &PlanRequest) -> Result<(), PlanError> {
        if request.duration_weeks == 0 {
            return Err(PlanError::InvalidDuration(request.duration_weeks));
        }

        if request.training_days.is_empty() {
            return Err(PlanError::NoTrainingDays);
        }

        if let Some(&day) = request.training_days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(PlanError::InvalidDay(day));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(days: &[u8], weeks: u32) -> PlanRequest {
        PlanRequest {
            name: "Spring 10K".to_string(),
            goal: Some("10K".to_string()),
            level: AthleteLevel::Beginner,
            duration_weeks: weeks,
            training_days: days.iter().copied().collect(),
        }
    }

    #[test]
    fn test_beginner_long_run() {
        let session = SessionPlanGenerator::default_session(6, AthleteLevel::Beginner).unwrap();

        assert_eq!(session.session_type, SessionType::LongRun);
        assert_eq!(session.distance_km, dec!(6));
        assert_eq!(session.duration_minutes, dec!(40));
        assert_eq!(session.intensity, Intensity::Moderate);
    }

    #[test]
    fn test_weekday_profiles() {
        let level = AthleteLevel::Intermediate;
        let day = |d| SessionPlanGenerator::default_session(d, level).unwrap();

        let light = day(1);
        assert_eq!(light.session_type, SessionType::LightRun);
        assert_eq!((light.distance_km, light.duration_minutes), (dec!(5), dec!(30)));
        assert_eq!(light.intensity, Intensity::Light);

        let interval = day(3);
        assert_eq!(interval.session_type, SessionType::Interval);
        assert_eq!((interval.distance_km, interval.duration_minutes), (dec!(6), dec!(45)));
        assert_eq!(interval.intensity, Intensity::High);

        let tempo = day(5);
        assert_eq!(tempo.session_type, SessionType::Tempo);
        assert_eq!((tempo.distance_km, tempo.duration_minutes), (dec!(5.5), dec!(36)));
        assert_eq!(tempo.intensity, Intensity::Moderate);

        for regular in [2, 4, 7] {
            let session = day(regular);
            assert_eq!(session.session_type, SessionType::RegularRun);
            assert_eq!(session.distance_km, dec!(5));
            assert_eq!(session.intensity, Intensity::Light);
        }
    }

    #[test]
    fn test_levels_scale_proportionally() {
        let beginner = SessionPlanGenerator::default_session(1, AthleteLevel::Beginner).unwrap();
        let advanced = SessionPlanGenerator::default_session(1, AthleteLevel::Advanced).unwrap();

        assert_eq!(beginner.distance_km, dec!(3));
        assert_eq!(advanced.distance_km, dec!(7));
        assert_eq!(advanced.duration_minutes, dec!(40));
    }

    #[test]
    fn test_invalid_day() {
        assert_eq!(
            SessionPlanGenerator::default_session(0, AthleteLevel::Beginner),
            Err(PlanError::InvalidDay(0))
        );
        assert_eq!(
            SessionPlanGenerator::default_session(8, AthleteLevel::Advanced),
            Err(PlanError::InvalidDay(8))
        );
    }

    #[test]
    fn test_plan_generation() {
        let plan = TrainingPlanGenerator::generate(&request(&[6, 1, 3], 4)).unwrap();

        assert_eq!(plan.sessions.len(), 12);
        assert_eq!(plan.training_days, vec![1, 3, 6]);
        assert_eq!(plan.sessions[0].id, "week1-day1");
        assert_eq!(plan.sessions[11].id, "week4-day6");

        let week_two = plan.sessions_for_week(2);
        assert_eq!(week_two.len(), 3);
        assert!(week_two.iter().all(|s| s.week == 2));

        // Per week: 3 + 3.6 + 6 km, 20 + 30 + 40 min
        assert_eq!(plan.total_distance_km, dec!(50.4));
        assert_eq!(plan.total_duration_minutes, dec!(360));
    }

    #[test]
    fn test_plan_validation() {
        assert_eq!(
            TrainingPlanGenerator::generate(&request(&[], 4)),
            Err(PlanError::NoTrainingDays)
        );
        assert_eq!(
            TrainingPlanGenerator::generate(&request(&[1], 0)),
            Err(PlanError::InvalidDuration(0))
        );
        assert_eq!(
            TrainingPlanGenerator::generate(&request(&[1, 9], 2)),
            Err(PlanError::InvalidDay(9))
        );
    }

    #[test]
    fn test_session_description() {
        let session = SessionPlanGenerator::default_session(3, AthleteLevel::Beginner).unwrap();
        assert_eq!(session.describe(), "Interval: 3.6 km in 30 min (High)");
    }

    #[test]
    fn test_plan_serialization_flattens_template() {
        let plan = TrainingPlanGenerator::generate(&request(&[1], 1)).unwrap();
        let json = serde_json::to_string(&plan).unwrap();

        assert!(json.contains("\"id\":\"week1-day1\""));
        assert!(json.contains("\"session_type\":\"LightRun\""));

        let deserialized: TrainingPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, plan);
    }
}
