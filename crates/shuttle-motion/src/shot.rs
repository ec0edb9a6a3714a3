//! Shot types and the mapping from swing labels to shots with confidence.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use shuttle_core::{MovementFeatures, PixelPoint, ThresholdConfig};

use crate::swing::SwingLabel;

/// Fixed confidence for frames re-labelled as follow-through
pub const FOLLOW_THROUGH_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    Smash,
    Clear,
    Drop,
    Net,
    Drive,
    Lift,
    FollowThrough,
    Preparation,
    Ready,
    Static,
}

impl ShotType {
    pub const ALL: [ShotType; 10] = [
        ShotType::Smash,
        ShotType::Clear,
        ShotType::Drop,
        ShotType::Net,
        ShotType::Drive,
        ShotType::Lift,
        ShotType::FollowThrough,
        ShotType::Preparation,
        ShotType::Ready,
        ShotType::Static,
    ];

    /// Real strokes, as opposed to states between strokes
    pub fn is_actual_shot(self) -> bool {
        matches!(
            self,
            ShotType::Smash
                | ShotType::Clear
                | ShotType::Drop
                | ShotType::Net
                | ShotType::Drive
                | ShotType::Lift
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShotType::Smash => "smash",
            ShotType::Clear => "clear",
            ShotType::Drop => "drop",
            ShotType::Net => "net",
            ShotType::Drive => "drive",
            ShotType::Lift => "lift",
            ShotType::FollowThrough => "follow_through",
            ShotType::Preparation => "preparation",
            ShotType::Ready => "ready",
            ShotType::Static => "static",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotClassification {
    pub label: SwingLabel,
    pub shot_type: ShotType,
    pub confidence: f64,
}

impl ShotClassification {
    /// The same swing seen again inside the cooldown window
    pub fn into_follow_through(self) -> Self {
        Self {
            shot_type: ShotType::FollowThrough,
            confidence: FOLLOW_THROUGH_CONFIDENCE,
            ..self
        }
    }
}

/// Map a swing label and the current wrist velocity to a shot type and confidence
pub fn classify_swing(label: SwingLabel, velocity: f64, t: &ThresholdConfig) -> ShotClassification {
    let (shot_type, confidence) = match label {
        SwingLabel::SmashArc => (
            ShotType::Smash,
            (0.7 + (velocity - t.smash_vs_clear) * 0.1).min(0.95),
        ),
        SwingLabel::ClearArc => (
            ShotType::Clear,
            (0.6 + (velocity - t.gentle_overhead) * 0.15).min(0.90),
        ),
        SwingLabel::DropArc => (ShotType::Drop, (0.5 + velocity * 0.2).min(0.85)),
        SwingLabel::PowerOverhead if velocity > t.smash_vs_clear => (
            ShotType::Smash,
            (0.7 + (velocity - t.smash_vs_clear) * 0.1).min(0.9),
        ),
        SwingLabel::PowerOverhead => (
            ShotType::Clear,
            (0.6 + (velocity - t.gentle_overhead) * 0.15).min(0.85),
        ),
        SwingLabel::GentleOverhead => (ShotType::Drop, (0.5 + velocity * 0.2).min(0.8)),
        SwingLabel::NetPlay => (ShotType::Net, (0.5 + (velocity - t.net_min) * 0.5).min(0.75)),
        SwingLabel::Drive => (ShotType::Drive, (0.5 + (velocity - t.drive) * 0.2).min(0.75)),
        SwingLabel::Lift => (ShotType::Lift, (0.5 + (velocity - t.lift) * 0.2).min(0.7)),
        SwingLabel::Movement => (ShotType::Preparation, 0.4),
        SwingLabel::Ready => (ShotType::Ready, 0.5),
        SwingLabel::Static => (ShotType::Static, 0.3),
    };

    ShotClassification {
        label,
        shot_type,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// An accepted shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    pub frame_index: u64,
    pub timestamp: f64,
    pub shot_type: ShotType,
    pub confidence: f64,
    pub wrist_pixel: PixelPoint,
    pub features: MovementFeatures,
}

/// Accepted shots per type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotCounters(BTreeMap<ShotType, u32>);

impl ShotCounters {
    pub fn increment(&mut self, shot_type: ShotType) {
        *self.0.entry(shot_type).or_insert(0) += 1;
    }

    pub fn get(&self, shot_type: ShotType) -> u32 {
        self.0.get(&shot_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShotType, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn as_map(&self) -> &BTreeMap<ShotType, u32> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smash_arc_confidence() {
        let t = ThresholdConfig::default();
        let c = classify_swing(SwingLabel::SmashArc, 3.0, &t);
        assert_eq!(c.shot_type, ShotType::Smash);
        assert!((c.confidence - 0.76).abs() < 1e-9);

        let capped = classify_swing(SwingLabel::SmashArc, 10.0, &t);
        assert!((capped.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_clear_and_drop_arc() {
        let t = ThresholdConfig::default();

        let clear = classify_swing(SwingLabel::ClearArc, 1.8, &t);
        assert_eq!(clear.shot_type, ShotType::Clear);
        assert!((clear.confidence - 0.75).abs() < 1e-9);

        let drop = classify_swing(SwingLabel::DropArc, 0.5, &t);
        assert_eq!(drop.shot_type, ShotType::Drop);
        assert!((drop.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_power_overhead_splits_on_smash_threshold() {
        let t = ThresholdConfig::default();
        assert_eq!(
            classify_swing(SwingLabel::PowerOverhead, 2.0, &t).shot_type,
            ShotType::Clear
        );
        let smash = classify_swing(SwingLabel::PowerOverhead, 6.0, &t);
        assert_eq!(smash.shot_type, ShotType::Smash);
        assert!((smash.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_confidences() {
        let t = ThresholdConfig::default();
        assert_eq!(classify_swing(SwingLabel::Movement, 0.5, &t).confidence, 0.4);
        assert_eq!(classify_swing(SwingLabel::Ready, 0.2, &t).confidence, 0.5);
        assert_eq!(classify_swing(SwingLabel::Static, 0.0, &t).confidence, 0.3);
    }

    #[test]
    fn test_follow_through() {
        let t = ThresholdConfig::default();
        let c = classify_swing(SwingLabel::SmashArc, 3.0, &t).into_follow_through();
        assert_eq!(c.shot_type, ShotType::FollowThrough);
        assert_eq!(c.confidence, FOLLOW_THROUGH_CONFIDENCE);
        assert_eq!(c.label, SwingLabel::SmashArc);
    }

    #[test]
    fn test_counters_serialize_as_names() {
        let mut counters = ShotCounters::default();
        counters.increment(ShotType::Smash);
        counters.increment(ShotType::Smash);
        counters.increment(ShotType::Net);

        assert_eq!(counters.total(), 3);
        let json = serde_json::to_string(&counters).unwrap();
        assert_eq!(json, r#"{"smash":2,"net":1}"#);
    }
}
