//! Kinematic features extracted from consecutive pose samples.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::thresholds::ThresholdConfig;
use crate::types::{Handedness, Joint, Point2D, PoseLandmarks};

/// Rolling history length kept per session
pub const HISTORY_CAPACITY: usize = 10;

/// Dominant direction of wrist travel between two frames (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// No previous sample, or no displacement at all
    #[default]
    None,
}

impl Direction {
    pub fn from_delta(dx: f64, dy: f64) -> Self {
        if dx == 0.0 && dy == 0.0 {
            return Direction::None;
        }

        if dy.abs() > dx.abs() {
            if dy > 0.0 {
                Direction::Down
            } else {
                Direction::Up
            }
        } else if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// The handful of body points classification works with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySample {
    pub wrist: Point2D,
    pub elbow: Point2D,
    pub shoulder_center: Point2D,
    pub hip_center: Point2D,
    pub ankle_midpoint: Point2D,
}

impl BodySample {
    pub fn from_landmarks(pose: &PoseLandmarks, handedness: Handedness) -> Self {
        Self {
            wrist: pose.point(handedness.wrist()),
            elbow: pose.point(handedness.elbow()),
            shoulder_center: pose.midpoint(Joint::LeftShoulder, Joint::RightShoulder),
            hip_center: pose.midpoint(Joint::LeftHip, Joint::RightHip),
            ankle_midpoint: pose.midpoint(Joint::LeftAnkle, Joint::RightAnkle),
        }
    }
}

/// One entry of the rolling motion history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub timestamp: f64,
    pub wrist: Point2D,
    pub elbow: Point2D,
    pub shoulder_center: Point2D,
    pub hip_center: Point2D,
    pub direction: Direction,
}

impl MotionState {
    pub fn new(timestamp: f64, body: &BodySample, direction: Direction) -> Self {
        Self {
            timestamp,
            wrist: body.wrist,
            elbow: body.elbow,
            shoulder_center: body.shoulder_center,
            hip_center: body.hip_center,
            direction,
        }
    }

    pub fn is_overhead(&self, overhead_offset: f64) -> bool {
        self.wrist.y < self.shoulder_center.y - overhead_offset
    }
}

/// Fixed-capacity FIFO of motion states; pushing onto a full history evicts
/// the oldest entry
#[derive(Debug, Clone)]
pub struct MotionHistory {
    states: VecDeque<MotionState>,
    capacity: usize,
}

impl MotionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            states: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a state, returning the evicted one if the history was full
    pub fn push(&mut self, state: MotionState) -> Option<MotionState> {
        let evicted = if self.states.len() == self.capacity {
            self.states.pop_front()
        } else {
            None
        };
        self.states.push_back(state);
        evicted
    }

    pub fn last(&self) -> Option<&MotionState> {
        self.states.back()
    }

    /// The most recent `n` states, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &MotionState> {
        let skip = self.states.len().saturating_sub(n);
        self.states.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotionState> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

impl Default for MotionHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

/// Per-frame movement features, kept as a snapshot on every shot event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementFeatures {
    pub timestamp: f64,
    /// Seconds since the previous sample (nominal interval if none or non-positive)
    pub time_delta: f64,
    pub wrist_velocity: f64,
    pub body_velocity: f64,
    pub wrist_direction: Direction,
    pub is_overhead: bool,
    pub is_low_position: bool,
    pub is_arm_extended: bool,
    pub wrist: Point2D,
    pub shoulder_center: Point2D,
    pub hip_center: Point2D,
}

impl MovementFeatures {
    /// Wrist strictly between the shoulder line and the hip line
    pub fn is_mid_body(&self) -> bool {
        self.wrist.y > self.shoulder_center.y && self.wrist.y < self.hip_center.y
    }
}

/// Computes [`MovementFeatures`] from the current body sample and the history
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    nominal_fps: f64,
}

impl FeatureExtractor {
    pub fn new(nominal_fps: f64) -> Self {
        let nominal_fps = if nominal_fps.is_finite() && nominal_fps > 0.0 {
            nominal_fps
        } else {
            30.0
        };
        Self { nominal_fps }
    }

    pub fn nominal_interval(&self) -> f64 {
        1.0 / self.nominal_fps
    }

    /// Time between two samples, substituting the nominal frame interval for
    /// non-positive gaps
    pub fn time_delta(&self, previous: f64, current: f64) -> f64 {
        let dt = current - previous;
        if dt > 0.0 && dt.is_finite() {
            dt
        } else {
            self.nominal_interval()
        }
    }

    pub fn extract(
        &self,
        history: &MotionHistory,
        body: &BodySample,
        timestamp: f64,
        thresholds: &ThresholdConfig,
    ) -> MovementFeatures {
        let (time_delta, wrist_velocity, body_velocity, wrist_direction) = match history.last() {
            Some(prev) => {
                let dt = self.time_delta(prev.timestamp, timestamp);
                let dx = body.wrist.x - prev.wrist.x;
                let dy = body.wrist.y - prev.wrist.y;
                (
                    dt,
                    body.wrist.distance_to(&prev.wrist) / dt,
                    body.shoulder_center.distance_to(&prev.shoulder_center) / dt,
                    Direction::from_delta(dx, dy),
                )
            }
            None => (self.nominal_interval(), 0.0, 0.0, Direction::None),
        };

        MovementFeatures {
            timestamp,
            time_delta,
            wrist_velocity,
            body_velocity,
            wrist_direction,
            is_overhead: body.wrist.y < body.shoulder_center.y - thresholds.overhead_offset,
            is_low_position: body.wrist.y > body.hip_center.y - thresholds.low_position_offset,
            is_arm_extended: body.wrist.distance_to(&body.shoulder_center)
                > thresholds.arm_extension_min,
            wrist: body.wrist,
            shoulder_center: body.shoulder_center,
            hip_center: body.hip_center,
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with_wrist(x: f64, y: f64) -> BodySample {
        BodySample {
            wrist: Point2D::new(x, y),
            elbow: Point2D::new(0.5, 0.35),
            shoulder_center: Point2D::new(0.5, 0.3),
            hip_center: Point2D::new(0.5, 0.55),
            ankle_midpoint: Point2D::new(0.5, 0.9),
        }
    }

    #[test]
    fn test_wrist_velocity() {
        let extractor = FeatureExtractor::default();
        let thresholds = ThresholdConfig::default();
        let mut history = MotionHistory::default();

        let first = body_with_wrist(0.10, 0.10);
        history.push(MotionState::new(1.0, &first, Direction::None));

        let second = body_with_wrist(0.14, 0.10);
        let features = extractor.extract(&history, &second, 1.1, &thresholds);

        assert!((features.time_delta - 0.1).abs() < 1e-9);
        assert!((features.wrist_velocity - 0.4).abs() < 1e-9);
        assert_eq!(features.wrist_direction, Direction::Right);
    }

    #[test]
    fn test_non_positive_time_delta_uses_nominal_interval() {
        let extractor = FeatureExtractor::new(25.0);
        assert!((extractor.time_delta(2.0, 2.0) - 0.04).abs() < 1e-12);
        assert!((extractor.time_delta(2.0, 1.5) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_direction_buckets() {
        assert_eq!(Direction::from_delta(0.01, 0.05), Direction::Down);
        assert_eq!(Direction::from_delta(0.01, -0.05), Direction::Up);
        assert_eq!(Direction::from_delta(-0.05, 0.01), Direction::Left);
        assert_eq!(Direction::from_delta(0.05, 0.05), Direction::Right);
        assert_eq!(Direction::from_delta(0.0, 0.0), Direction::None);
    }

    #[test]
    fn test_position_predicates() {
        let extractor = FeatureExtractor::default();
        let thresholds = ThresholdConfig::default();
        let history = MotionHistory::default();

        let overhead = extractor.extract(&history, &body_with_wrist(0.6, 0.1), 0.0, &thresholds);
        assert!(overhead.is_overhead);
        assert!(!overhead.is_low_position);
        assert!(overhead.is_arm_extended);

        let low = extractor.extract(&history, &body_with_wrist(0.5, 0.6), 0.0, &thresholds);
        assert!(!low.is_overhead);
        assert!(low.is_low_position);
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = MotionHistory::new(3);
        let body = body_with_wrist(0.5, 0.5);

        for i in 0..3 {
            assert!(history.push(MotionState::new(i as f64, &body, Direction::Up)).is_none());
        }
        let evicted = history.push(MotionState::new(3.0, &body, Direction::Down));

        assert_eq!(evicted.map(|s| s.timestamp), Some(0.0));
        assert_eq!(history.len(), 3);

        let recent: Vec<f64> = history.recent(2).map(|s| s.timestamp).collect();
        assert_eq!(recent, vec![2.0, 3.0]);
    }
}
