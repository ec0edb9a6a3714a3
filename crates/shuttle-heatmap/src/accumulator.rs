//! In-court foot position samples.

use serde::{Deserialize, Serialize};
use shuttle_core::{CourtRegion, FrameSize, PixelPoint, Point2D};

/// Fewest samples a heatmap is rendered from
pub const DEFAULT_MIN_SAMPLES: usize = 10;

/// Ankle midpoint of the player on one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootPositionSample {
    pub pixel: PixelPoint,
    pub normalized: Point2D,
    pub frame_index: u64,
    pub timestamp: f64,
    /// Rally the sample belongs to; `None` between rallies
    pub rally_id: Option<u64>,
}

/// Collects foot positions that fall inside the court
#[derive(Debug, Clone)]
pub struct SpatialAccumulator {
    court: CourtRegion,
    samples: Vec<FootPositionSample>,
}

impl SpatialAccumulator {
    pub fn new(court: CourtRegion) -> Self {
        Self {
            court,
            samples: Vec::new(),
        }
    }

    /// Record a foot position; positions outside the court are dropped
    pub fn record(
        &mut self,
        ankle: Point2D,
        frame: FrameSize,
        frame_index: u64,
        timestamp: f64,
        rally_id: Option<u64>,
    ) -> Option<FootPositionSample> {
        let pixel = ankle.to_pixel(frame);
        if !self.court.contains_point(pixel) {
            return None;
        }

        let sample = FootPositionSample {
            pixel,
            normalized: ankle,
            frame_index,
            timestamp,
            rally_id,
        };
        self.samples.push(sample);
        Some(sample)
    }

    /// Move every sample of `rally_id` to between rallies
    pub fn release_rally(&mut self, rally_id: u64) -> usize {
        self.retag(|s| s.rally_id == Some(rally_id))
    }

    /// Move samples of `rally_id` recorded after `end_frame` to between rallies
    pub fn trim_rally(&mut self, rally_id: u64, end_frame: u64) -> usize {
        self.retag(|s| s.rally_id == Some(rally_id) && s.frame_index > end_frame)
    }

    fn retag(&mut self, predicate: impl Fn(&FootPositionSample) -> bool) -> usize {
        let mut changed = 0;
        for sample in self.samples.iter_mut().filter(|s| predicate(s)) {
            sample.rally_id = None;
            changed += 1;
        }
        changed
    }

    pub fn court(&self) -> &CourtRegion {
        &self.court
    }

    pub fn samples(&self) -> &[FootPositionSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn has_enough(&self, min_samples: usize) -> bool {
        self.samples.len() >= min_samples
    }
}
