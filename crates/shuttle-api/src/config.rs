//! Service configuration.

use serde::{Deserialize, Serialize};
use shuttle_core::{Error, Handedness, Result, ThresholdConfig};
use shuttle_heatmap::HeatmapConfig;
use shuttle_motion::{ExerciseKind, DEFAULT_RALLY_GAP_FRAMES};
use shuttle_pose::OracleOptions;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `SHUTTLE_SESSION__RALLY_GAP_FRAMES=60`
pub const ENV_PREFIX: &str = "SHUTTLE";

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Defaults applied to every new session
    pub session: SessionSettings,

    /// Base thresholds; per-session overrides are applied on top
    pub thresholds: ThresholdConfig,

    /// Options handed to the pose oracle factory
    pub oracle: OracleOptions,

    pub heatmap: HeatmapConfig,

    /// Where session artifacts are written
    pub output: OutputSettings,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Frames without an accepted shot before a rally closes
    pub rally_gap_frames: u64,

    /// Frame rate assumed when timestamps do not advance
    pub nominal_fps: f64,

    pub handedness: Handedness,

    /// Keep every detected pose and export it on session end
    pub record_timeline: bool,

    /// Count reps for this exercise instead of only classifying shots
    pub exercise: Option<ExerciseKind>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rally_gap_frames: DEFAULT_RALLY_GAP_FRAMES,
            nominal_fps: 30.0,
            handedness: Handedness::Right,
            record_timeline: false,
            exercise: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory for heatmap and timeline files
    pub directory: PathBuf,

    /// Render a heatmap on session end when enough samples exist
    pub heatmap: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            heatmap: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(Self::environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::deserialize_validated(settings)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::deserialize_validated(settings)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn deserialize_validated(settings: config::Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.oracle.validate()?;
        self.heatmap.validate()?;

        if !(self.session.nominal_fps.is_finite() && self.session.nominal_fps > 0.0) {
            return Err(Error::Config(format!(
                "session.nominal_fps must be positive, got {}",
                self.session.nominal_fps
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.session.rally_gap_frames, 90);
        assert_eq!(config.heatmap.grid_resolution, 50);
        assert_eq!(config.oracle.model_complexity, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = std::env::temp_dir().join(format!("shuttle-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shuttle.toml");
        std::fs::write(
            &path,
            r#"
[session]
rally_gap_frames = 45
handedness = "left"
exercise = "squat"

[thresholds]
cooldown_seconds = 1.2
static = 0.05

[heatmap]
sigma = 3.0
"#,
        )
        .unwrap();

        let config = ServiceConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.session.rally_gap_frames, 45);
        assert_eq!(config.session.handedness, Handedness::Left);
        assert_eq!(config.session.exercise, Some(ExerciseKind::Squat));
        assert!((config.thresholds.cooldown_seconds - 1.2).abs() < 1e-12);
        assert!((config.thresholds.static_velocity - 0.05).abs() < 1e-12);
        // Untouched fields keep their defaults
        assert!((config.thresholds.smash_vs_clear - 2.4).abs() < 1e-12);
        assert_eq!(config.heatmap.canvas_width, 400);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ServiceConfig::default();
        config.session.nominal_fps = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
