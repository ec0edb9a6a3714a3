//! End-of-session report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shuttle_core::{CourtRegion, PixelPoint, SessionId};
use shuttle_heatmap::{RallyBoundary, ZoneCount};
use shuttle_motion::{ExerciseSummary, Rally, ShotCounters, ShotEvent, ShotType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_shots: usize,
    pub total_rallies: usize,
    pub frames_processed: u64,
    /// Frames with a valid in-court player over frames processed
    pub player_detection_rate: f64,
    /// Mean confidence of accepted shots
    pub avg_confidence: f64,
    pub foot_positions_recorded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallySummary {
    pub rally_id: u64,
    /// Seconds from first to last shot
    pub duration: f64,
    pub shot_count: usize,
    pub shot_type_sequence: Vec<ShotType>,
}

impl From<&Rally> for RallySummary {
    fn from(rally: &Rally) -> Self {
        Self {
            rally_id: rally.id,
            duration: rally.duration(),
            shot_count: rally.shot_count(),
            shot_type_sequence: rally.shot_type_sequence(),
        }
    }
}

pub(crate) fn rally_boundary(rally: &Rally) -> RallyBoundary {
    RallyBoundary {
        rally_id: rally.id,
        start_frame: rally.start_frame,
        end_frame: rally.end_frame,
        start_time: rally.start_time,
        end_time: rally.end_time,
        shot_count: rally.shot_count(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineShot {
    pub time: f64,
    pub shot_type: ShotType,
    pub confidence: f64,
}

impl From<&ShotEvent> for TimelineShot {
    fn from(event: &ShotEvent) -> Self {
        Self {
            time: event.timestamp,
            shot_type: event.shot_type,
            confidence: event.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtSettings {
    /// Top-left, top-right, bottom-left, bottom-right
    pub corners: [PixelPoint; 4],
    pub color: String,
}

impl From<&CourtRegion> for CourtSettings {
    fn from(court: &CourtRegion) -> Self {
        Self {
            corners: court.corners(),
            color: court.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub shot_distribution: ShotCounters,
    pub rallies: Vec<RallySummary>,
    pub shot_timeline: Vec<TimelineShot>,
    pub court_settings: CourtSettings,
    pub busiest_zone: Option<ZoneCount>,
    pub heatmap_image_path: Option<PathBuf>,
    pub heatmap_data_path: Option<PathBuf>,
    pub timeline_path: Option<PathBuf>,
    pub exercise: Option<ExerciseSummary>,
}

impl Report {
    pub fn has_heatmap(&self) -> bool {
        self.heatmap_image_path.is_some()
    }

    pub fn to_json(&self) -> shuttle_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
