//! Per-session state and frame processing.
//!
//! A [`SessionContext`] owns everything one video or live stream needs: its
//! pose oracle, the swing analyzer, the foot-position accumulator and the
//! counters that end up in the report. Frames are processed strictly in order
//! by a single caller.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use shuttle_core::{
    BodySample, CourtRegion, Error, Handedness, PoseLandmarks, Result, SessionId,
    ThresholdConfig, ThresholdOverrides,
};
use shuttle_heatmap::{
    write_artifacts, FootPositionSample, HeatmapArtifacts, HeatmapData, HeatmapRenderer,
    SpatialAccumulator, ZoneCount,
};
use shuttle_motion::{
    ExerciseKind, ExerciseSummary, ExerciseTracker, RallyClose, RepEvent, ShotClassification,
    ShotCounters, ShotEvent, SwingAnalyzer,
};
use shuttle_pose::{frame_size, FrameInput, PoseOracle};

use crate::config::{OutputSettings, SessionSettings};
use crate::report::{rally_boundary, CourtSettings, RallySummary, Report, ReportSummary, TimelineShot};

/// Everything needed to start one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub court: CourtRegion,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
    #[serde(flatten)]
    pub settings: SessionSettings,
}

impl SessionConfig {
    pub fn new(court: CourtRegion) -> Self {
        Self {
            court,
            thresholds: ThresholdOverrides::default(),
            settings: SessionSettings::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: ThresholdOverrides) -> Self {
        self.thresholds = overrides;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.settings.handedness = handedness;
        self
    }

    pub fn with_exercise(mut self, exercise: ExerciseKind) -> Self {
        self.settings.exercise = Some(exercise);
        self
    }

    pub fn recording_timeline(mut self) -> Self {
        self.settings.record_timeline = true;
        self
    }

    /// Apply the overrides to `base` and validate the result
    pub fn resolve_thresholds(&self, base: &ThresholdConfig) -> Result<ThresholdConfig> {
        let thresholds = base.with_overrides(&self.thresholds);
        thresholds.validate()?;
        Ok(thresholds)
    }
}

/// One detected pose kept for the full-timeline export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub frame_index: u64,
    pub timestamp: f64,
    pub landmarks: PoseLandmarks,
}

/// Outcome of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_index: u64,
    pub timestamp: f64,
    /// A player was detected and stands inside the court
    pub player_detected: bool,
    pub classification: Option<ShotClassification>,
    /// Set when this frame produced an accepted shot
    pub shot: Option<ShotEvent>,
    pub counters: ShotCounters,
    pub foot_position: Option<FootPositionSample>,
    pub rally_event: Option<RallyClose>,
    pub rep: Option<RepEvent>,
    pub exercise: Option<ExerciseSummary>,
}

pub struct SessionContext {
    id: SessionId,
    court: CourtRegion,
    handedness: Handedness,
    oracle: Option<Box<dyn PoseOracle>>,
    analyzer: SwingAnalyzer,
    accumulator: SpatialAccumulator,
    exercise: Option<ExerciseTracker>,
    timeline: Option<Vec<TimelineEntry>>,
    frames_processed: u64,
    player_detected: u64,
    started_at: DateTime<Utc>,
    finalized: bool,
}

impl SessionContext {
    /// `thresholds` must already have been validated
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        thresholds: ThresholdConfig,
        oracle: Box<dyn PoseOracle>,
    ) -> Self {
        let settings = &config.settings;
        Self {
            id,
            court: config.court.clone(),
            handedness: settings.handedness,
            oracle: Some(oracle),
            analyzer: SwingAnalyzer::new(thresholds, settings.rally_gap_frames, settings.nominal_fps),
            accumulator: SpatialAccumulator::new(config.court.clone()),
            exercise: settings.exercise.map(ExerciseTracker::new),
            timeline: settings.record_timeline.then(Vec::new),
            frames_processed: 0,
            player_detected: 0,
            started_at: Utc::now(),
            finalized: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn court(&self) -> &CourtRegion {
        &self.court
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn player_detected_frames(&self) -> u64 {
        self.player_detected
    }

    pub fn analyzer(&self) -> &SwingAnalyzer {
        &self.analyzer
    }

    pub fn foot_positions(&self) -> &[FootPositionSample] {
        self.accumulator.samples()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Decode and process one frame. Undecodable frames count as frames
    /// without a player.
    pub fn process_frame(&mut self, frame: FrameInput<'_>, timestamp: f64) -> FrameResult {
        match frame.decode() {
            Ok(image) => self.process_image(&image, timestamp),
            Err(e) => {
                tracing::debug!(session = %self.id, error = %e, "Frame decode failed");
                let frame_index = self.next_frame_index();
                self.no_player(frame_index, timestamp)
            }
        }
    }

    pub fn process_image(&mut self, image: &RgbImage, timestamp: f64) -> FrameResult {
        let frame_index = self.next_frame_index();
        let size = frame_size(image);

        let Some(pose) = self.detect(image) else {
            return self.no_player(frame_index, timestamp);
        };

        let center = pose.center().to_pixel(size);
        if !self.court.contains_point(center) {
            tracing::trace!(session = %self.id, frame = frame_index, "Player outside court");
            return self.no_player(frame_index, timestamp);
        }

        self.player_detected += 1;
        let body = BodySample::from_landmarks(&pose, self.handedness);
        let wrist_pixel = body.wrist.to_pixel(size);

        let analysis = self.analyzer.analyze(&body, timestamp, frame_index, wrist_pixel);

        let foot_position = self.accumulator.record(
            body.ankle_midpoint,
            size,
            frame_index,
            timestamp,
            self.analyzer.open_rally_id(),
        );
        if let Some(event) = &analysis.rally_event {
            self.apply_rally_close(event);
        }

        let rep = self
            .exercise
            .as_mut()
            .and_then(|tracker| tracker.update(&body, timestamp));

        if let Some(timeline) = self.timeline.as_mut() {
            timeline.push(TimelineEntry {
                frame_index,
                timestamp,
                landmarks: pose,
            });
        }

        FrameResult {
            frame_index,
            timestamp,
            player_detected: true,
            classification: Some(analysis.classification),
            shot: analysis.shot,
            counters: self.analyzer.counters().clone(),
            foot_position,
            rally_event: analysis.rally_event,
            rep,
            exercise: self.exercise.as_ref().map(|t| t.summary()),
        }
    }

    fn next_frame_index(&mut self) -> u64 {
        let index = self.frames_processed;
        self.frames_processed += 1;
        index
    }

    fn detect(&mut self, image: &RgbImage) -> Option<PoseLandmarks> {
        let oracle = self.oracle.as_mut()?;
        match oracle.detect(image) {
            Ok(pose) => pose,
            Err(e) => {
                tracing::debug!(session = %self.id, error = %e, "Pose inference failed");
                None
            }
        }
    }

    fn no_player(&mut self, frame_index: u64, timestamp: f64) -> FrameResult {
        let rally_event = self.analyzer.skip_frame();
        if let Some(event) = &rally_event {
            self.apply_rally_close(event);
        }

        FrameResult {
            frame_index,
            timestamp,
            player_detected: false,
            classification: None,
            shot: None,
            counters: self.analyzer.counters().clone(),
            foot_position: None,
            rally_event,
            rep: None,
            exercise: self.exercise.as_ref().map(|t| t.summary()),
        }
    }

    /// Keep foot-sample rally ids pointing at materialized rallies only
    fn apply_rally_close(&mut self, event: &RallyClose) {
        match event {
            RallyClose::Completed(rally) => {
                self.accumulator.trim_rally(rally.id, rally.end_frame);
            }
            RallyClose::Discarded { provisional_id, .. } => {
                self.accumulator.release_rally(*provisional_id);
            }
        }
    }

    /// Release the pose oracle; the session processes no detections afterwards
    pub fn close(&mut self) {
        if let Some(mut oracle) = self.oracle.take() {
            oracle.close();
            tracing::debug!(session = %self.id, "Released pose oracle");
        }
    }

    /// Flush the open rally, write artifacts and build the report.
    ///
    /// Artifact failures are logged and leave the corresponding path empty.
    pub fn finalize(&mut self, output: &OutputSettings, renderer: &HeatmapRenderer) -> Result<Report> {
        if self.finalized {
            return Err(Error::SessionNotFound(self.id));
        }
        self.finalized = true;

        if let Some(event) = self.analyzer.finish() {
            self.apply_rally_close(&event);
        }
        self.close();

        let (heatmap, busiest_zone) = if output.heatmap {
            self.write_heatmap(&output.directory, renderer)
        } else {
            (None, None)
        };
        let timeline_path = self.write_timeline(&output.directory);

        let shots = self.analyzer.shots();
        let summary = ReportSummary {
            total_shots: shots.len(),
            total_rallies: self.analyzer.rallies().len(),
            frames_processed: self.frames_processed,
            player_detection_rate: if self.frames_processed > 0 {
                self.player_detected as f64 / self.frames_processed as f64
            } else {
                0.0
            },
            avg_confidence: self.analyzer.average_confidence(),
            foot_positions_recorded: self.accumulator.len(),
        };

        let (heatmap_image_path, heatmap_data_path) = match heatmap {
            Some(a) => (Some(a.image_path), Some(a.data_path)),
            None => (None, None),
        };

        Ok(Report {
            session_id: self.id,
            started_at: self.started_at,
            generated_at: Utc::now(),
            summary,
            shot_distribution: self.analyzer.counters().clone(),
            rallies: self.analyzer.rallies().iter().map(RallySummary::from).collect(),
            shot_timeline: shots.iter().map(TimelineShot::from).collect(),
            court_settings: CourtSettings::from(&self.court),
            busiest_zone,
            heatmap_image_path,
            heatmap_data_path,
            timeline_path,
            exercise: self.exercise.as_ref().map(|t| t.summary()),
        })
    }

    fn write_heatmap(
        &self,
        dir: &Path,
        renderer: &HeatmapRenderer,
    ) -> (Option<HeatmapArtifacts>, Option<ZoneCount>) {
        let samples = self.accumulator.samples();
        let render = match renderer.render(&self.court, samples) {
            Ok(Some(render)) => render,
            Ok(None) => return (None, None),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Heatmap rendering failed");
                return (None, None);
            }
        };

        let rallies = self.analyzer.rallies().iter().map(rally_boundary).collect();
        let session = self.id.to_string();
        let data = HeatmapData::new(&session, &self.court, renderer.config(), &render, samples, rallies);

        match write_artifacts(dir, &session, &render, &data) {
            Ok(artifacts) => (Some(artifacts), render.busiest_zone),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Failed to write heatmap artifacts");
                (None, render.busiest_zone)
            }
        }
    }

    fn write_timeline(&self, dir: &Path) -> Option<PathBuf> {
        let timeline = self.timeline.as_ref()?;
        let path = dir.join(format!("{}_timeline.json", self.id));

        let written = std::fs::create_dir_all(dir)
            .map_err(Error::from)
            .and_then(|_| File::create(&path).map_err(Error::from))
            .and_then(|file| {
                serde_json::to_writer(BufWriter::new(file), timeline).map_err(Error::from)
            });

        match written {
            Ok(()) => {
                tracing::info!(
                    session = %self.id,
                    path = %path.display(),
                    poses = timeline.len(),
                    "Wrote pose timeline"
                );
                Some(path)
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Failed to write pose timeline");
                None
            }
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.close();
    }
}
