//! Playback of previously recorded landmarks.
//!
//! A recording is a JSON array with one entry per frame: either a landmark set
//! or `null` for frames without a detected player. The oracle ignores pixel
//! content and returns the next recorded entry on every call.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbImage;
use shuttle_core::{Error, PoseLandmarks, Result};

use crate::oracle::{OracleFactory, OracleOptions, PoseOracle};

pub struct ReplayOracle {
    frames: VecDeque<Option<PoseLandmarks>>,
    min_detection_confidence: f64,
    live: Option<Arc<AtomicUsize>>,
}

impl ReplayOracle {
    pub fn new(frames: Vec<Option<PoseLandmarks>>) -> Self {
        Self {
            frames: frames.into(),
            min_detection_confidence: 0.0,
            live: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let frames: Vec<Option<PoseLandmarks>> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn with_min_detection_confidence(mut self, threshold: f64) -> Self {
        self.min_detection_confidence = threshold;
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseOracle for ReplayOracle {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Option<PoseLandmarks>> {
        let pose = self.frames.pop_front().flatten();
        Ok(pose.filter(|p| p.mean_confidence() >= self.min_detection_confidence))
    }

    fn close(&mut self) {
        self.frames.clear();
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ReplayOracle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Hands every session its own copy of one recording and keeps count of the
/// instances that have not been closed yet
pub struct ReplayFactory {
    frames: Vec<Option<PoseLandmarks>>,
    live: Arc<AtomicUsize>,
    created: AtomicUsize,
    fail_after: Option<usize>,
}

impl ReplayFactory {
    pub fn new(frames: Vec<Option<PoseLandmarks>>) -> Self {
        Self {
            frames,
            live: Arc::new(AtomicUsize::new(0)),
            created: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Refuse to create more than `n` oracles, simulating model load failure
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Oracles created and not yet closed
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn created_instances(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl OracleFactory for ReplayFactory {
    fn create(&self, options: &OracleOptions) -> Result<Box<dyn PoseOracle>> {
        options.validate()?;

        let created = self.created.load(Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| created >= n) {
            return Err(Error::OracleInit(format!(
                "replay factory exhausted after {created} instances"
            )));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        let mut oracle = ReplayOracle::new(self.frames.clone())
            .with_min_detection_confidence(options.min_detection_confidence);
        oracle.live = Some(self.live.clone());

        tracing::debug!(frames = self.frames.len(), "Created replay oracle");
        Ok(Box::new(oracle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::{Joint, JointSample};

    fn pose(confidence: f64) -> PoseLandmarks {
        PoseLandmarks::new([JointSample::new(0.5, 0.5, confidence); Joint::COUNT])
    }

    #[test]
    fn test_replay_sequence() {
        let mut oracle = ReplayOracle::new(vec![Some(pose(0.9)), None, Some(pose(0.9))]);
        let frame = RgbImage::new(4, 4);

        assert!(oracle.detect(&frame).unwrap().is_some());
        assert!(oracle.detect(&frame).unwrap().is_none());
        assert!(oracle.detect(&frame).unwrap().is_some());
        // Exhausted recordings behave like empty frames
        assert!(oracle.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn test_low_confidence_filtered() {
        let mut oracle =
            ReplayOracle::new(vec![Some(pose(0.2))]).with_min_detection_confidence(0.5);
        assert!(oracle.detect(&RgbImage::new(4, 4)).unwrap().is_none());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::to_string(&vec![Some(pose(0.8)), None]).unwrap();
        let oracle = ReplayOracle::from_json(&json).unwrap();
        assert_eq!(oracle.remaining(), 2);
    }

    #[test]
    fn test_factory_tracks_live_instances() {
        let factory = ReplayFactory::new(vec![Some(pose(0.9))]);
        let options = OracleOptions::default();

        let mut a = factory.create(&options).unwrap();
        let b = factory.create(&options).unwrap();
        assert_eq!(factory.live_instances(), 2);

        a.close();
        assert_eq!(factory.live_instances(), 1);

        drop(b);
        assert_eq!(factory.live_instances(), 0);

        drop(a);
        assert_eq!(factory.live_instances(), 0);
        assert_eq!(factory.created_instances(), 2);
    }

    #[test]
    fn test_factory_failure() {
        let factory = ReplayFactory::new(Vec::new()).failing_after(0);
        let result = factory.create(&OracleOptions::default());
        assert!(matches!(result, Err(Error::OracleInit(_))));
        assert_eq!(factory.live_instances(), 0);
    }
}
