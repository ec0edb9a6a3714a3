//! Cooldown debouncing.
//!
//! One physical swing spans several frames and would otherwise be classified
//! as a shot on each of them. After a shot is accepted, further actual shots
//! inside the cooldown window are relabelled as follow-through.

use serde::{Deserialize, Serialize};

use crate::shot::ShotClassification;

/// Minimum confidence for a classification to count as a shot
pub const SHOT_CONFIDENCE_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownDecision {
    /// New shot; the debouncer has recorded its timestamp
    Accepted,
    /// Actual shot inside the cooldown window
    Suppressed,
    /// Not an actual shot, or not confident enough to be one
    NotAShot,
}

#[derive(Debug, Clone)]
pub struct CooldownDebouncer {
    cooldown_secs: f64,
    last_shot_timestamp: Option<f64>,
}

impl CooldownDebouncer {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            cooldown_secs,
            last_shot_timestamp: None,
        }
    }

    pub fn cooldown_secs(&self) -> f64 {
        self.cooldown_secs
    }

    pub fn last_shot_timestamp(&self) -> Option<f64> {
        self.last_shot_timestamp
    }

    /// Decide whether `classification` at `timestamp` is a new shot.
    ///
    /// Only an accepted shot updates the last-shot timestamp.
    pub fn evaluate(&mut self, classification: &ShotClassification, timestamp: f64) -> CooldownDecision {
        if !classification.shot_type.is_actual_shot()
            || classification.confidence <= SHOT_CONFIDENCE_FLOOR
        {
            return CooldownDecision::NotAShot;
        }

        if let Some(last) = self.last_shot_timestamp {
            if timestamp - last < self.cooldown_secs {
                return CooldownDecision::Suppressed;
            }
        }

        self.last_shot_timestamp = Some(timestamp);
        CooldownDecision::Accepted
    }

    pub fn reset(&mut self) {
        self.last_shot_timestamp = None;
    }
}
