use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::aggregate::MonthLabels;
use crate::logging::LogConfig;
use crate::models::AthleteLevel;
use crate::run_stats::{CalorieModel, DEFAULT_KCAL_PER_KM, REFERENCE_WEIGHT_KG};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Athlete profile used for calorie estimates and plan defaults
    #[serde(default)]
    pub athlete: AthleteSettings,

    /// Calorie model calibration
    #[serde(default)]
    pub calories: CalorieSettings,

    /// Presentation preferences
    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteSettings {
    /// Display name
    pub name: Option<String>,

    /// Body weight in kilograms
    pub weight_kg: Option<f64>,

    /// Level used when a plan request does not name one
    pub level: AthleteLevel,
}

/// Calorie estimate calibration: `kcal_per_km` is valid at `reference_weight_kg`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalorieSettings {
    pub kcal_per_km: f64,
    pub reference_weight_kg: f64,
}

impl Default for CalorieSettings {
    fn default() -> Self {
        Self {
            kcal_per_km: DEFAULT_KCAL_PER_KM,
            reference_weight_kg: REFERENCE_WEIGHT_KG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Language of month abbreviations in monthly summaries
    pub month_labels: MonthLabels,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            athlete: AthleteSettings::default(),
            calories: CalorieSettings::default(),
            display: DisplaySettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lazzfit")
            .join("config.toml")
    }

    /// Load configuration from `path`, or the default location when `None`,
    /// falling back to defaults when the file is missing or invalid
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Calorie model for the configured athlete, scaled to body weight when known
    pub fn calorie_model(&self) -> CalorieModel {
        match self.athlete.weight_kg {
            Some(weight_kg) => CalorieModel::scaled(
                self.calories.kcal_per_km,
                self.calories.reference_weight_kg,
                weight_kg,
            ),
            None => CalorieModel::new(self.calories.kcal_per_km),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.calories, deserialized.calories);
        assert_eq!(config.display.month_labels, deserialized.display.month_labels);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-01-01T00:00:00Z"
            updated_at = "2024-01-01T00:00:00Z"

            [athlete]
            weight_kg = 84.0
            level = "Advanced"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.athlete.level, AthleteLevel::Advanced);
        assert_eq!(config.calories.kcal_per_km, 65.0);
        assert_eq!(config.display.month_labels, MonthLabels::English);
    }

    #[test]
    fn test_calorie_model_from_weight() {
        let mut config = AppConfig::default();
        assert_eq!(config.calorie_model(), CalorieModel::default());

        config.athlete.weight_kg = Some(84.0);
        assert_eq!(config.calorie_model().estimate(1.0), Some(78));
    }

    #[test]
    fn test_invalid_calorie_constant_falls_back() {
        for constant in ["-65.0", "nan"] {
            let toml_str = format!(
                r#"
                [metadata]
                version = "1.0"
                created_at = "2024-01-01T00:00:00Z"
                updated_at = "2024-01-01T00:00:00Z"

                [calories]
                kcal_per_km = {constant}
                "#
            );

            let mut config: AppConfig = toml::from_str(&toml_str).unwrap();
            assert_eq!(config.calorie_model().estimate(1.0), Some(65));

            config.athlete.weight_kg = Some(84.0);
            assert_eq!(config.calorie_model().estimate(1.0), Some(78));
        }
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original_config = AppConfig::default();
        original_config.athlete.name = Some("Ana".to_string());
        original_config.display.month_labels = MonthLabels::Portuguese;

        original_config.save_to_file(&config_path).unwrap();
        let loaded_config = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded_config.athlete.name.as_deref(), Some("Ana"));
        assert_eq!(loaded_config.display.month_labels, MonthLabels::Portuguese);
    }

    #[test]
    fn test_load_or_default_on_missing_or_invalid_file() {
        let temp_dir = tempdir().unwrap();

        let missing = temp_dir.path().join("missing.toml");
        let config = AppConfig::load_or_default(Some(&missing));
        assert_eq!(config.calories, CalorieSettings::default());

        let invalid = temp_dir.path().join("invalid.toml");
        fs::write(&invalid, "this is = = not toml").unwrap();
        let config = AppConfig::load_or_default(Some(&invalid));
        assert_eq!(config.athlete, AthleteSettings::default());
    }
}
