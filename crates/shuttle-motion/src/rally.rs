//! Rally segmentation.
//!
//! The first accepted shot opens a rally. Every later frame without an accepted
//! shot counts towards the gap; once the gap exceeds the threshold the rally is
//! closed. Rallies with fewer than two shots are dropped without consuming an id.

use serde::{Deserialize, Serialize};

use crate::shot::{ShotEvent, ShotType};

/// Default inactivity gap before a rally closes (frames)
pub const DEFAULT_RALLY_GAP_FRAMES: u64 = 90;
/// Fewest shots a rally must contain to be kept
pub const MIN_RALLY_SHOTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rally {
    /// Per-session id, starting at 1 with no gaps
    pub id: u64,
    pub shots: Vec<ShotEvent>,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_time: f64,
    pub end_time: f64,
}

impl Rally {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn shot_count(&self) -> usize {
        self.shots.len()
    }

    pub fn shot_type_sequence(&self) -> Vec<ShotType> {
        self.shots.iter().map(|s| s.shot_type).collect()
    }
}

/// Outcome of closing the open rally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RallyClose {
    Completed(Rally),
    /// Too short to keep; `provisional_id` was never assigned
    Discarded { provisional_id: u64, shot_count: usize },
}

#[derive(Debug, Clone)]
struct OpenRally {
    provisional_id: u64,
    shots: Vec<ShotEvent>,
}

#[derive(Debug, Clone)]
pub struct RallySegmenter {
    gap_frames: u64,
    open: Option<OpenRally>,
    frames_since_last_shot: u64,
    counter: u64,
    rallies: Vec<Rally>,
}

impl RallySegmenter {
    pub fn new(gap_frames: u64) -> Self {
        Self {
            gap_frames,
            open: None,
            frames_since_last_shot: 0,
            counter: 0,
            rallies: Vec::new(),
        }
    }

    /// Append an accepted shot, opening a rally if none is open
    pub fn record_shot(&mut self, event: ShotEvent) {
        self.frames_since_last_shot = 0;
        let provisional_id = self.counter + 1;
        self.open
            .get_or_insert_with(|| OpenRally {
                provisional_id,
                shots: Vec::new(),
            })
            .shots
            .push(event);
    }

    /// Count one frame without an accepted shot, closing the rally once the
    /// gap is exceeded
    pub fn tick(&mut self) -> Option<RallyClose> {
        self.open.as_ref()?;

        self.frames_since_last_shot += 1;
        if self.frames_since_last_shot > self.gap_frames {
            self.close()
        } else {
            None
        }
    }

    /// Force-close the open rally, if any
    pub fn flush(&mut self) -> Option<RallyClose> {
        self.close()
    }

    fn close(&mut self) -> Option<RallyClose> {
        let open = self.open.take()?;
        self.frames_since_last_shot = 0;

        let (first, last) = match (open.shots.first(), open.shots.last()) {
            (Some(first), Some(last)) if open.shots.len() >= MIN_RALLY_SHOTS => {
                (first.clone(), last.clone())
            }
            _ => {
                tracing::debug!(
                    provisional_id = open.provisional_id,
                    shots = open.shots.len(),
                    "Discarding short rally"
                );
                return Some(RallyClose::Discarded {
                    provisional_id: open.provisional_id,
                    shot_count: open.shots.len(),
                });
            }
        };

        self.counter += 1;
        let rally = Rally {
            id: self.counter,
            start_frame: first.frame_index,
            end_frame: last.frame_index,
            start_time: first.timestamp,
            end_time: last.timestamp,
            shots: open.shots,
        };

        tracing::info!(
            rally_id = rally.id,
            shots = rally.shot_count(),
            duration = rally.duration(),
            "Rally closed"
        );

        self.rallies.push(rally.clone());
        Some(RallyClose::Completed(rally))
    }

    /// Id the open rally will receive if it is kept
    pub fn open_rally_id(&self) -> Option<u64> {
        self.open.as_ref().map(|r| r.provisional_id)
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn frames_since_last_shot(&self) -> u64 {
        self.frames_since_last_shot
    }

    pub fn gap_frames(&self) -> u64 {
        self.gap_frames
    }

    pub fn rallies(&self) -> &[Rally] {
        &self.rallies
    }
}

impl Default for RallySegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_RALLY_GAP_FRAMES)
    }
}
