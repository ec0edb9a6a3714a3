//! Swing pattern matching.
//!
//! Two detectors run on every frame with a detected player:
//!
//! - The **arc detector** looks at the last three history entries for one
//!   continuous up-then-down wrist trajectory that passed above the shoulder
//!   line. Its descent speed separates smashes, clears and drops.
//! - The **single-frame fallback** buckets the current wrist velocity,
//!   direction and body position into power/gentle overhead, drive, net play,
//!   lift, movement, ready or static.
//!
//! The arc detector always runs first; the fallback is only consulted when it
//! does not fire.

use serde::{Deserialize, Serialize};
use shuttle_core::{Direction, MotionHistory, MovementFeatures, ThresholdConfig};

/// History entries inspected by the arc detector
pub const ARC_WINDOW: usize = 3;
/// Longest an up-then-down arc may take, oldest window entry to now (seconds)
pub const ARC_MAX_DURATION_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingLabel {
    SmashArc,
    ClearArc,
    DropArc,
    PowerOverhead,
    GentleOverhead,
    Drive,
    NetPlay,
    Lift,
    Movement,
    Ready,
    Static,
}

impl SwingLabel {
    pub fn is_arc(self) -> bool {
        matches!(
            self,
            SwingLabel::SmashArc | SwingLabel::ClearArc | SwingLabel::DropArc
        )
    }
}

/// Classify the current frame: arc detector first, single-frame fallback otherwise
pub fn detect_swing(
    history: &MotionHistory,
    features: &MovementFeatures,
    thresholds: &ThresholdConfig,
) -> SwingLabel {
    detect_arc(history, features, thresholds)
        .unwrap_or_else(|| classify_single_frame(features, thresholds))
}

/// Up-then-down overhead arc over the last [`ARC_WINDOW`] history entries.
///
/// `history` must not yet contain the current frame.
pub fn detect_arc(
    history: &MotionHistory,
    features: &MovementFeatures,
    t: &ThresholdConfig,
) -> Option<SwingLabel> {
    if history.len() < ARC_WINDOW {
        return None;
    }

    if features.wrist_direction != Direction::Down {
        return None;
    }

    let window: Vec<_> = history.recent(ARC_WINDOW).collect();

    let rising = window
        .iter()
        .filter(|s| s.direction == Direction::Up)
        .count();
    if rising < 2 {
        return None;
    }

    if !window.iter().any(|s| s.is_overhead(t.overhead_offset)) {
        return None;
    }

    let elapsed = features.timestamp - window[0].timestamp;
    if elapsed >= ARC_MAX_DURATION_SECS {
        return None;
    }

    let v = features.wrist_velocity;
    if v > t.smash_vs_clear {
        Some(SwingLabel::SmashArc)
    } else if v > t.gentle_overhead {
        Some(SwingLabel::ClearArc)
    } else if v > t.drop_min {
        Some(SwingLabel::DropArc)
    } else {
        None
    }
}

pub fn classify_single_frame(f: &MovementFeatures, t: &ThresholdConfig) -> SwingLabel {
    let v = f.wrist_velocity;
    let dir = f.wrist_direction;

    if v < t.static_velocity {
        return SwingLabel::Static;
    }

    if v > t.power_overhead && dir == Direction::Up && f.is_overhead {
        return SwingLabel::PowerOverhead;
    }

    if v > t.gentle_overhead && f.is_overhead && (dir == Direction::Up || dir.is_horizontal()) {
        return SwingLabel::GentleOverhead;
    }

    if v > t.drive && dir.is_horizontal() && f.is_mid_body() {
        return SwingLabel::Drive;
    }

    if f.is_low_position
        && f.is_arm_extended
        && v > t.net_min
        && v < t.net_max
        && (dir == Direction::Down || dir.is_horizontal())
    {
        return SwingLabel::NetPlay;
    }

    if f.is_low_position && dir == Direction::Up && v > t.lift {
        return SwingLabel::Lift;
    }

    if v > t.movement {
        return SwingLabel::Movement;
    }

    SwingLabel::Ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::{BodySample, MotionState, Point2D};

    fn body(wrist_y: f64) -> BodySample {
        BodySample {
            wrist: Point2D::new(0.6, wrist_y),
            elbow: Point2D::new(0.55, 0.3),
            shoulder_center: Point2D::new(0.5, 0.3),
            hip_center: Point2D::new(0.5, 0.55),
            ankle_midpoint: Point2D::new(0.5, 0.9),
        }
    }

    fn features(velocity: f64, direction: Direction, timestamp: f64) -> MovementFeatures {
        MovementFeatures {
            timestamp,
            time_delta: 1.0 / 30.0,
            wrist_velocity: velocity,
            body_velocity: 0.0,
            wrist_direction: direction,
            is_overhead: false,
            is_low_position: false,
            is_arm_extended: false,
            wrist: Point2D::new(0.6, 0.4),
            shoulder_center: Point2D::new(0.5, 0.3),
            hip_center: Point2D::new(0.5, 0.55),
        }
    }

    fn rising_history(start: f64) -> MotionHistory {
        let mut history = MotionHistory::default();
        // Wrist climbs above the shoulder line (0.3 - 0.05)
        for (i, y) in [0.3, 0.22, 0.15].iter().enumerate() {
            history.push(MotionState::new(start + i as f64 * 0.05, &body(*y), Direction::Up));
        }
        history
    }

    #[test]
    fn test_arc_smash_scenario() {
        let t = ThresholdConfig::default();
        let history = rising_history(1.0);
        let f = features(3.0, Direction::Down, 1.2);

        assert_eq!(detect_swing(&history, &f, &t), SwingLabel::SmashArc);

        let shot = crate::shot::classify_swing(SwingLabel::SmashArc, f.wrist_velocity, &t);
        assert_eq!(shot.shot_type, crate::ShotType::Smash);
        assert!((shot.confidence - 0.76).abs() < 1e-9);
    }

    #[test]
    fn test_arc_descent_speed_buckets() {
        let t = ThresholdConfig::default();
        let history = rising_history(1.0);

        assert_eq!(
            detect_arc(&history, &features(1.2, Direction::Down, 1.2), &t),
            Some(SwingLabel::ClearArc)
        );
        assert_eq!(
            detect_arc(&history, &features(0.5, Direction::Down, 1.2), &t),
            Some(SwingLabel::DropArc)
        );
        assert_eq!(detect_arc(&history, &features(0.2, Direction::Down, 1.2), &t), None);
    }

    #[test]
    fn test_arc_requires_recent_window() {
        let t = ThresholdConfig::default();
        let history = rising_history(1.0);
        // Oldest window entry is 0.5s old
        assert_eq!(detect_arc(&history, &features(3.0, Direction::Down, 1.5), &t), None);
    }

    #[test]
    fn test_arc_requires_overhead() {
        let t = ThresholdConfig::default();
        let mut history = MotionHistory::default();
        for i in 0..3 {
            history.push(MotionState::new(1.0 + i as f64 * 0.05, &body(0.4), Direction::Up));
        }
        assert_eq!(detect_arc(&history, &features(3.0, Direction::Down, 1.2), &t), None);
    }

    #[test]
    fn test_arc_requires_three_entries_and_descent() {
        let t = ThresholdConfig::default();
        let mut short = MotionHistory::default();
        short.push(MotionState::new(1.0, &body(0.1), Direction::Up));
        short.push(MotionState::new(1.05, &body(0.1), Direction::Up));
        assert_eq!(detect_arc(&short, &features(3.0, Direction::Down, 1.1), &t), None);

        let history = rising_history(1.0);
        assert_eq!(detect_arc(&history, &features(3.0, Direction::Left, 1.2), &t), None);
    }

    #[test]
    fn test_fallback_static_and_ready() {
        let t = ThresholdConfig::default();
        assert_eq!(
            classify_single_frame(&features(0.05, Direction::Left, 0.0), &t),
            SwingLabel::Static
        );
        assert_eq!(
            classify_single_frame(&features(0.2, Direction::Left, 0.0), &t),
            SwingLabel::Ready
        );
        assert_eq!(
            classify_single_frame(&features(0.5, Direction::Left, 0.0), &t),
            SwingLabel::Movement
        );
    }

    #[test]
    fn test_fallback_overheads() {
        let t = ThresholdConfig::default();
        let mut f = features(2.0, Direction::Up, 0.0);
        f.is_overhead = true;
        assert_eq!(classify_single_frame(&f, &t), SwingLabel::PowerOverhead);

        f.wrist_direction = Direction::Right;
        assert_eq!(classify_single_frame(&f, &t), SwingLabel::GentleOverhead);

        f.wrist_direction = Direction::Down;
        assert_eq!(classify_single_frame(&f, &t), SwingLabel::Movement);
    }

    #[test]
    fn test_fallback_drive() {
        let t = ThresholdConfig::default();
        // Wrist at 0.4 sits between shoulders (0.3) and hips (0.55)
        let f = features(1.2, Direction::Left, 0.0);
        assert_eq!(classify_single_frame(&f, &t), SwingLabel::Drive);
    }

    #[test]
    fn test_fallback_net_and_lift() {
        let t = ThresholdConfig::default();

        let mut net = features(0.5, Direction::Down, 0.0);
        net.is_low_position = true;
        net.is_arm_extended = true;
        assert_eq!(classify_single_frame(&net, &t), SwingLabel::NetPlay);

        let mut lift = features(0.9, Direction::Up, 0.0);
        lift.is_low_position = true;
        lift.is_arm_extended = true;
        assert_eq!(classify_single_frame(&lift, &t), SwingLabel::Lift);
    }
}
