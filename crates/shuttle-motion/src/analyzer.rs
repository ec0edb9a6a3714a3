//! Per-session swing analyzer tying together feature extraction, swing
//! detection, shot classification, cooldown and rally segmentation.

use serde::{Deserialize, Serialize};
use shuttle_core::{
    BodySample, FeatureExtractor, MotionHistory, MotionState, MovementFeatures, PixelPoint,
    ThresholdConfig,
};

use crate::cooldown::{CooldownDebouncer, CooldownDecision};
use crate::rally::{Rally, RallyClose, RallySegmenter};
use crate::shot::{classify_swing, ShotClassification, ShotCounters, ShotEvent};
use crate::swing::detect_swing;

/// Everything the analyzer concluded about one frame with a detected player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub features: MovementFeatures,
    /// Final classification, already relabelled if the cooldown suppressed it
    pub classification: ShotClassification,
    pub decision: CooldownDecision,
    /// Set when the frame produced an accepted shot
    pub shot: Option<ShotEvent>,
    /// Rally closed or discarded on this frame
    pub rally_event: Option<RallyClose>,
}

/// Swing analyzer
pub struct SwingAnalyzer {
    extractor: FeatureExtractor,
    thresholds: ThresholdConfig,
    history: MotionHistory,
    debouncer: CooldownDebouncer,
    rallies: RallySegmenter,
    shots: Vec<ShotEvent>,
    counters: ShotCounters,
}

impl SwingAnalyzer {
    pub fn new(thresholds: ThresholdConfig, rally_gap_frames: u64, nominal_fps: f64) -> Self {
        Self {
            extractor: FeatureExtractor::new(nominal_fps),
            debouncer: CooldownDebouncer::new(thresholds.cooldown_seconds),
            thresholds,
            history: MotionHistory::default(),
            rallies: RallySegmenter::new(rally_gap_frames),
            shots: Vec::new(),
            counters: ShotCounters::default(),
        }
    }

    /// Analyze one frame with a detected player
    pub fn analyze(
        &mut self,
        body: &BodySample,
        timestamp: f64,
        frame_index: u64,
        wrist_pixel: PixelPoint,
    ) -> FrameAnalysis {
        let features = self
            .extractor
            .extract(&self.history, body, timestamp, &self.thresholds);

        // Arc detection looks at history before the current frame is appended
        let label = detect_swing(&self.history, &features, &self.thresholds);
        let classification = classify_swing(label, features.wrist_velocity, &self.thresholds);

        self.history
            .push(MotionState::new(timestamp, body, features.wrist_direction));

        let decision = self.debouncer.evaluate(&classification, timestamp);
        match decision {
            CooldownDecision::Accepted => {
                let event = ShotEvent {
                    frame_index,
                    timestamp,
                    shot_type: classification.shot_type,
                    confidence: classification.confidence,
                    wrist_pixel,
                    features,
                };

                tracing::debug!(
                    frame = frame_index,
                    shot = %event.shot_type,
                    confidence = event.confidence,
                    "Shot accepted"
                );

                self.counters.increment(event.shot_type);
                self.shots.push(event.clone());
                self.rallies.record_shot(event.clone());

                FrameAnalysis {
                    features,
                    classification,
                    decision,
                    shot: Some(event),
                    rally_event: None,
                }
            }
            CooldownDecision::Suppressed => FrameAnalysis {
                features,
                classification: classification.into_follow_through(),
                decision,
                shot: None,
                rally_event: self.rallies.tick(),
            },
            CooldownDecision::NotAShot => FrameAnalysis {
                features,
                classification,
                decision,
                shot: None,
                rally_event: self.rallies.tick(),
            },
        }
    }

    /// Account for a frame without a valid player
    pub fn skip_frame(&mut self) -> Option<RallyClose> {
        self.rallies.tick()
    }

    /// Close any open rally; used once at session end
    pub fn finish(&mut self) -> Option<RallyClose> {
        self.rallies.flush()
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn history(&self) -> &MotionHistory {
        &self.history
    }

    pub fn shots(&self) -> &[ShotEvent] {
        &self.shots
    }

    pub fn counters(&self) -> &ShotCounters {
        &self.counters
    }

    pub fn rallies(&self) -> &[Rally] {
        self.rallies.rallies()
    }

    pub fn open_rally_id(&self) -> Option<u64> {
        self.rallies.open_rally_id()
    }

    pub fn last_shot_timestamp(&self) -> Option<f64> {
        self.debouncer.last_shot_timestamp()
    }

    /// Mean confidence over accepted shots, 0 when there are none
    pub fn average_confidence(&self) -> f64 {
        if self.shots.is_empty() {
            return 0.0;
        }
        self.shots.iter().map(|s| s.confidence).sum::<f64>() / self.shots.len() as f64
    }
}

impl Default for SwingAnalyzer {
    fn default() -> Self {
        Self::new(
            ThresholdConfig::default(),
            crate::rally::DEFAULT_RALLY_GAP_FRAMES,
            30.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shot::ShotType;
    use shuttle_core::Point2D;

    const FPS: f64 = 30.0;

    fn body(wrist_y: f64) -> BodySample {
        BodySample {
            wrist: Point2D::new(0.6, wrist_y),
            elbow: Point2D::new(0.58, 0.32),
            shoulder_center: Point2D::new(0.5, 0.3),
            hip_center: Point2D::new(0.5, 0.55),
            ankle_midpoint: Point2D::new(0.5, 0.9),
        }
    }

    /// Slow overhead wind-up followed by a fast downward strike
    const SWING: [f64; 6] = [0.32, 0.30, 0.28, 0.26, 0.24, 0.34];

    fn feed(analyzer: &mut SwingAnalyzer, start_frame: u64, ys: &[f64]) -> Vec<FrameAnalysis> {
        ys.iter()
            .enumerate()
            .map(|(i, y)| {
                let frame = start_frame + i as u64;
                analyzer.analyze(&body(*y), frame as f64 / FPS, frame, PixelPoint::new(0, 0))
            })
            .collect()
    }

    #[test]
    fn test_smash_detected_once() {
        let mut analyzer = SwingAnalyzer::default();
        let results = feed(&mut analyzer, 0, &SWING);

        let shots: Vec<_> = results.iter().filter_map(|r| r.shot.as_ref()).collect();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].shot_type, ShotType::Smash);
        assert_eq!(shots[0].frame_index, 5);
        assert!((shots[0].confidence - 0.76).abs() < 1e-6);

        // The continuing strike is a follow-through of the same swing
        let next = feed(&mut analyzer, 6, &[0.44]);
        assert_eq!(next[0].decision, CooldownDecision::Suppressed);
        assert_eq!(next[0].classification.shot_type, ShotType::FollowThrough);
        assert_eq!(analyzer.counters().get(ShotType::Smash), 1);
        assert_eq!(analyzer.last_shot_timestamp(), Some(5.0 / FPS));
    }

    #[test]
    fn test_two_swings_form_a_rally() {
        let mut analyzer = SwingAnalyzer::new(ThresholdConfig::default(), 90, FPS);
        feed(&mut analyzer, 0, &SWING);
        feed(&mut analyzer, 6, &[0.44; 34]);
        feed(&mut analyzer, 40, &SWING);

        assert_eq!(analyzer.shots().len(), 2);
        assert_eq!(analyzer.open_rally_id(), Some(1));

        let mut closed = None;
        for _ in 0..91 {
            if let Some(event) = analyzer.skip_frame() {
                closed = Some(event);
                break;
            }
        }

        match closed {
            Some(RallyClose::Completed(rally)) => {
                assert_eq!(rally.id, 1);
                assert_eq!(rally.start_frame, 5);
                assert_eq!(rally.end_frame, 45);
                assert_eq!(rally.shot_type_sequence(), vec![ShotType::Smash, ShotType::Smash]);
            }
            other => panic!("expected completed rally, got {other:?}"),
        }
        assert!((analyzer.average_confidence() - 0.76).abs() < 1e-6);
    }

    #[test]
    fn test_finish_discards_single_shot() {
        let mut analyzer = SwingAnalyzer::default();
        feed(&mut analyzer, 0, &SWING);

        assert!(matches!(
            analyzer.finish(),
            Some(RallyClose::Discarded { shot_count: 1, .. })
        ));
        assert!(analyzer.rallies().is_empty());
        assert!(analyzer.finish().is_none());
    }

    #[test]
    fn test_history_bounded() {
        let mut analyzer = SwingAnalyzer::default();
        feed(&mut analyzer, 0, &[0.5; 25]);
        assert_eq!(analyzer.history().len(), shuttle_core::HISTORY_CAPACITY);
        assert_eq!(analyzer.average_confidence(), 0.0);
    }
}
