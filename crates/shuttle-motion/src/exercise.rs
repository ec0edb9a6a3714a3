//! Exercise rep counting.
//!
//! Every exercise alternates between a *loaded* pose (bottom of a squat, arms
//! up in a jumping jack, feet away from centre in a side shuffle) and the
//! *released* pose it starts from. A rep is counted when the body goes from
//! loaded back to released. Enter and exit thresholds differ so jitter around
//! a single threshold does not count extra reps.

use serde::{Deserialize, Serialize};
use shuttle_core::BodySample;

/// Minimum time between two counted reps (seconds)
pub const DEFAULT_MIN_REP_INTERVAL_SECS: f64 = 0.5;

/// Hip height over shoulder height, both measured above the ankles
const SQUAT_LOADED_RATIO: f64 = 0.40;
const SQUAT_RELEASED_RATIO: f64 = 0.50;

/// Wrist height above the shoulder line
const JACK_LOADED_OFFSET: f64 = 0.05;
const JACK_RELEASED_OFFSET: f64 = 0.0;

/// Lateral hip displacement from where the player started
const SHUFFLE_LOADED_SHIFT: f64 = 0.10;
const SHUFFLE_RELEASED_SHIFT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    JumpingJack,
    SideShuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExercisePhase {
    #[default]
    Released,
    Loaded,
}

/// State shared by every exercise kind
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseState {
    pub reps: u32,
    pub phase: ExercisePhase,
    pub last_rep_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub kind: ExerciseKind,
    pub reps: u32,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub kind: ExerciseKind,
    #[serde(flatten)]
    pub state: ExerciseState,
}

#[derive(Debug, Clone)]
pub struct ExerciseTracker {
    kind: ExerciseKind,
    state: ExerciseState,
    min_rep_interval: f64,
    /// Hip x of the first sample; side shuffles are measured against it
    origin_x: Option<f64>,
}

impl ExerciseTracker {
    pub fn new(kind: ExerciseKind) -> Self {
        Self {
            kind,
            state: ExerciseState::default(),
            min_rep_interval: DEFAULT_MIN_REP_INTERVAL_SECS,
            origin_x: None,
        }
    }

    pub fn with_min_rep_interval(mut self, secs: f64) -> Self {
        self.min_rep_interval = secs;
        self
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn state(&self) -> &ExerciseState {
        &self.state
    }

    pub fn summary(&self) -> ExerciseSummary {
        ExerciseSummary {
            kind: self.kind,
            state: self.state,
        }
    }

    /// Feed one body sample; returns the rep completed on this frame, if any
    pub fn update(&mut self, body: &BodySample, timestamp: f64) -> Option<RepEvent> {
        let next = match self.kind {
            ExerciseKind::Squat => self.squat_phase(body),
            ExerciseKind::JumpingJack => self.jumping_jack_phase(body),
            ExerciseKind::SideShuffle => self.side_shuffle_phase(body),
        };

        let previous = std::mem::replace(&mut self.state.phase, next);
        if previous != ExercisePhase::Loaded || next != ExercisePhase::Released {
            return None;
        }

        if let Some(last) = self.state.last_rep_time {
            if timestamp - last < self.min_rep_interval {
                return None;
            }
        }

        self.state.reps += 1;
        self.state.last_rep_time = Some(timestamp);
        tracing::debug!(kind = ?self.kind, reps = self.state.reps, "Rep counted");

        Some(RepEvent {
            kind: self.kind,
            reps: self.state.reps,
            timestamp,
        })
    }

    fn squat_phase(&self, body: &BodySample) -> ExercisePhase {
        let torso_and_legs = body.ankle_midpoint.y - body.shoulder_center.y;
        if torso_and_legs <= f64::EPSILON {
            return self.state.phase;
        }
        let ratio = (body.ankle_midpoint.y - body.hip_center.y) / torso_and_legs;

        hysteresis(
            self.state.phase,
            ratio < SQUAT_LOADED_RATIO,
            ratio > SQUAT_RELEASED_RATIO,
        )
    }

    fn jumping_jack_phase(&self, body: &BodySample) -> ExercisePhase {
        let lift = body.shoulder_center.y - body.wrist.y;
        hysteresis(
            self.state.phase,
            lift > JACK_LOADED_OFFSET,
            lift < JACK_RELEASED_OFFSET,
        )
    }

    fn side_shuffle_phase(&mut self, body: &BodySample) -> ExercisePhase {
        let origin = *self.origin_x.get_or_insert(body.hip_center.x);
        let shift = (body.hip_center.x - origin).abs();
        hysteresis(
            self.state.phase,
            shift > SHUFFLE_LOADED_SHIFT,
            shift < SHUFFLE_RELEASED_SHIFT,
        )
    }
}

fn hysteresis(current: ExercisePhase, loaded: bool, released: bool) -> ExercisePhase {
    match current {
        ExercisePhase::Released if loaded => ExercisePhase::Loaded,
        ExercisePhase::Loaded if released => ExercisePhase::Released,
        phase => phase,
    }
}
