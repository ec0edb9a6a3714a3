//! Classification thresholds.
//!
//! Velocities are in fractions of the frame extent per second, offsets in
//! fractions of the frame extent. A session starts from [`ThresholdConfig::default`]
//! and applies a [`ThresholdOverrides`] on top; the merged config is validated
//! once, before the first frame is processed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_STATIC: f64 = 0.10;
pub const DEFAULT_MOVEMENT: f64 = 0.30;
pub const DEFAULT_POWER_OVERHEAD: f64 = 1.50;
pub const DEFAULT_GENTLE_OVERHEAD: f64 = 0.80;
pub const DEFAULT_DRIVE: f64 = 1.00;
pub const DEFAULT_NET_MIN: f64 = 0.20;
pub const DEFAULT_NET_MAX: f64 = 0.80;
pub const DEFAULT_LIFT: f64 = 0.60;
pub const DEFAULT_SMASH_VS_CLEAR: f64 = 2.40;
pub const DEFAULT_DROP_MIN: f64 = 0.30;
pub const DEFAULT_OVERHEAD_OFFSET: f64 = 0.05;
pub const DEFAULT_LOW_POSITION_OFFSET: f64 = 0.05;
pub const DEFAULT_ARM_EXTENSION_MIN: f64 = 0.15;
pub const DEFAULT_COOLDOWN_SECONDS: f64 = 0.80;

/// Named thresholds driving swing classification and debouncing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Below this wrist speed the player is static
    #[serde(rename = "static", alias = "static_velocity")]
    pub static_velocity: f64,
    /// Above this wrist speed the player is preparing / moving
    pub movement: f64,
    pub power_overhead: f64,
    pub gentle_overhead: f64,
    pub drive: f64,
    pub net_min: f64,
    pub net_max: f64,
    pub lift: f64,
    /// Arc descent speed separating smashes from clears
    pub smash_vs_clear: f64,
    pub drop_min: f64,
    /// How far above the shoulder line the wrist must be to count as overhead
    pub overhead_offset: f64,
    pub low_position_offset: f64,
    pub arm_extension_min: f64,
    #[serde(alias = "cooldown")]
    pub cooldown_seconds: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            static_velocity: DEFAULT_STATIC,
            movement: DEFAULT_MOVEMENT,
            power_overhead: DEFAULT_POWER_OVERHEAD,
            gentle_overhead: DEFAULT_GENTLE_OVERHEAD,
            drive: DEFAULT_DRIVE,
            net_min: DEFAULT_NET_MIN,
            net_max: DEFAULT_NET_MAX,
            lift: DEFAULT_LIFT,
            smash_vs_clear: DEFAULT_SMASH_VS_CLEAR,
            drop_min: DEFAULT_DROP_MIN,
            overhead_offset: DEFAULT_OVERHEAD_OFFSET,
            low_position_offset: DEFAULT_LOW_POSITION_OFFSET,
            arm_extension_min: DEFAULT_ARM_EXTENSION_MIN,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
        }
    }
}

impl ThresholdConfig {
    /// Merge overrides on top of this config; unset fields keep their value
    pub fn with_overrides(mut self, overrides: &ThresholdOverrides) -> Self {
        if let Some(v) = overrides.static_velocity {
            self.static_velocity = v;
        }
        if let Some(v) = overrides.movement {
            self.movement = v;
        }
        if let Some(v) = overrides.power_overhead {
            self.power_overhead = v;
        }
        if let Some(v) = overrides.gentle_overhead {
            self.gentle_overhead = v;
        }
        if let Some(v) = overrides.drive {
            self.drive = v;
        }
        if let Some(v) = overrides.net_min {
            self.net_min = v;
        }
        if let Some(v) = overrides.net_max {
            self.net_max = v;
        }
        if let Some(v) = overrides.lift {
            self.lift = v;
        }
        if let Some(v) = overrides.smash_vs_clear {
            self.smash_vs_clear = v;
        }
        if let Some(v) = overrides.drop_min {
            self.drop_min = v;
        }
        if let Some(v) = overrides.overhead_offset {
            self.overhead_offset = v;
        }
        if let Some(v) = overrides.low_position_offset {
            self.low_position_offset = v;
        }
        if let Some(v) = overrides.arm_extension_min {
            self.arm_extension_min = v;
        }
        if let Some(v) = overrides.cooldown_seconds {
            self.cooldown_seconds = v;
        }
        self
    }

    fn named(&self) -> [(&'static str, f64); 14] {
        [
            ("static", self.static_velocity),
            ("movement", self.movement),
            ("power_overhead", self.power_overhead),
            ("gentle_overhead", self.gentle_overhead),
            ("drive", self.drive),
            ("net_min", self.net_min),
            ("net_max", self.net_max),
            ("lift", self.lift),
            ("smash_vs_clear", self.smash_vs_clear),
            ("drop_min", self.drop_min),
            ("overhead_offset", self.overhead_offset),
            ("low_position_offset", self.low_position_offset),
            ("arm_extension_min", self.arm_extension_min),
            ("cooldown_seconds", self.cooldown_seconds),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidThreshold {
                    name,
                    reason: format!("must be a finite non-negative number, got {value}"),
                });
            }
        }

        if self.net_min >= self.net_max {
            return Err(Error::InvalidThreshold {
                name: "net_min",
                reason: format!(
                    "must be below net_max ({} >= {})",
                    self.net_min, self.net_max
                ),
            });
        }

        if self.static_velocity > self.movement {
            return Err(Error::InvalidThreshold {
                name: "static",
                reason: format!(
                    "must not exceed movement ({} > {})",
                    self.static_velocity, self.movement
                ),
            });
        }

        Ok(())
    }
}

/// Per-session threshold overrides; `None` keeps the default.
///
/// Deserializes from a flat `name -> number` object. Unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdOverrides {
    #[serde(rename = "static", alias = "static_velocity")]
    pub static_velocity: Option<f64>,
    pub movement: Option<f64>,
    pub power_overhead: Option<f64>,
    pub gentle_overhead: Option<f64>,
    pub drive: Option<f64>,
    pub net_min: Option<f64>,
    pub net_max: Option<f64>,
    pub lift: Option<f64>,
    pub smash_vs_clear: Option<f64>,
    pub drop_min: Option<f64>,
    pub overhead_offset: Option<f64>,
    pub low_position_offset: Option<f64>,
    pub arm_extension_min: Option<f64>,
    #[serde(alias = "cooldown")]
    pub cooldown_seconds: Option<f64>,
}

impl ThresholdOverrides {
    /// Build overrides from a flat map of threshold names
    pub fn from_map(map: &HashMap<String, f64>) -> Self {
        let mut overrides = Self::default();

        for (key, &value) in map {
            let slot = match key.as_str() {
                "static" | "static_velocity" => &mut overrides.static_velocity,
                "movement" => &mut overrides.movement,
                "power_overhead" => &mut overrides.power_overhead,
                "gentle_overhead" => &mut overrides.gentle_overhead,
                "drive" => &mut overrides.drive,
                "net_min" => &mut overrides.net_min,
                "net_max" => &mut overrides.net_max,
                "lift" => &mut overrides.lift,
                "smash_vs_clear" => &mut overrides.smash_vs_clear,
                "drop_min" => &mut overrides.drop_min,
                "overhead_offset" => &mut overrides.overhead_offset,
                "low_position_offset" => &mut overrides.low_position_offset,
                "arm_extension_min" => &mut overrides.arm_extension_min,
                "cooldown" | "cooldown_seconds" => &mut overrides.cooldown_seconds,
                _ => continue,
            };
            *slot = Some(value);
        }

        overrides
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ThresholdConfig::default().validate().is_ok());
    }

    #[test]
    fn test_override_merge() {
        let mut map = HashMap::new();
        map.insert("smash_vs_clear".to_string(), 3.0);
        map.insert("cooldown".to_string(), 1.2);
        map.insert("not_a_threshold".to_string(), 99.0);

        let overrides = ThresholdOverrides::from_map(&map);
        let config = ThresholdConfig::default().with_overrides(&overrides);

        assert_eq!(config.smash_vs_clear, 3.0);
        assert_eq!(config.cooldown_seconds, 1.2);
        assert_eq!(config.drive, DEFAULT_DRIVE);
    }

    #[test]
    fn test_overrides_from_json_ignore_unknown_keys() {
        let json = r#"{"static": 0.05, "net_max": 0.9, "bogus": 1.0}"#;
        let overrides: ThresholdOverrides = serde_json::from_str(json).unwrap();

        assert_eq!(overrides.static_velocity, Some(0.05));
        assert_eq!(overrides.net_max, Some(0.9));
        assert_eq!(overrides.lift, None);
    }

    #[test]
    fn test_base_config_accepts_threshold_names() {
        let config: ThresholdConfig = serde_json::from_str(r#"{"static": 0.25}"#).unwrap();
        assert_eq!(config.static_velocity, 0.25);
        assert_eq!(config.movement, DEFAULT_MOVEMENT);

        let config: ThresholdConfig =
            serde_json::from_str(r#"{"static_velocity": 0.2, "cooldown": 1.5}"#).unwrap();
        assert_eq!(config.static_velocity, 0.2);
        assert_eq!(config.cooldown_seconds, 1.5);

        // Serializes under the canonical name
        let json = serde_json::to_value(ThresholdConfig::default()).unwrap();
        assert_eq!(json["static"], DEFAULT_STATIC);
        assert!(json.get("static_velocity").is_none());
    }

    #[test]
    fn test_validation_rejects_inverted_net_window() {
        let overrides = ThresholdOverrides {
            net_min: Some(0.9),
            ..Default::default()
        };
        let config = ThresholdConfig::default().with_overrides(&overrides);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidThreshold { name: "net_min", .. })
        ));
    }

    #[test]
    fn test_validation_rejects_negative() {
        let overrides = ThresholdOverrides {
            cooldown_seconds: Some(-1.0),
            ..Default::default()
        };
        let config = ThresholdConfig::default().with_overrides(&overrides);
        assert!(config.validate().is_err());
    }
}
