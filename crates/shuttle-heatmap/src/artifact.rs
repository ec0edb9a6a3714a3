//! Heatmap output files: the rendered PNG and a JSON document with the raw
//! samples, rally boundaries and zone statistics.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shuttle_core::{CourtRegion, Error, Result};

use crate::accumulator::FootPositionSample;
use crate::histogram::ZoneCount;
use crate::render::{HeatmapConfig, HeatmapRender};

/// Frame and time span of one rally, as referenced by sample rally ids
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RallyBoundary {
    pub rally_id: u64,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub shot_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub court: CourtRegion,
    pub grid_resolution: usize,
    pub sigma: f64,
    pub sample_count: usize,
    pub samples: Vec<FootPositionSample>,
    pub rallies: Vec<RallyBoundary>,
    pub zones: Vec<ZoneCount>,
    pub busiest_zone: Option<ZoneCount>,
}

impl HeatmapData {
    pub fn new(
        session_id: impl Into<String>,
        court: &CourtRegion,
        config: &HeatmapConfig,
        render: &HeatmapRender,
        samples: &[FootPositionSample],
        rallies: Vec<RallyBoundary>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            generated_at: Utc::now(),
            court: court.clone(),
            grid_resolution: config.grid_resolution,
            sigma: config.sigma,
            sample_count: samples.len(),
            samples: samples.to_vec(),
            rallies,
            zones: render.zones.clone(),
            busiest_zone: render.busiest_zone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapArtifacts {
    pub image_path: PathBuf,
    pub data_path: PathBuf,
}

/// Write `<session>_heatmap.png` and `<session>_heatmap.json` into `dir`
pub fn write_artifacts(
    dir: &Path,
    session_id: &str,
    render: &HeatmapRender,
    data: &HeatmapData,
) -> Result<HeatmapArtifacts> {
    std::fs::create_dir_all(dir)?;

    let image_path = dir.join(format!("{session_id}_heatmap.png"));
    render
        .image
        .save(&image_path)
        .map_err(|e| Error::Render(format!("{}: {e}", image_path.display())))?;

    let data_path = dir.join(format!("{session_id}_heatmap.json"));
    let writer = BufWriter::new(File::create(&data_path)?);
    serde_json::to_writer_pretty(writer, data)?;

    tracing::info!(
        image = %image_path.display(),
        data = %data_path.display(),
        samples = data.sample_count,
        "Wrote heatmap artifacts"
    );

    Ok(HeatmapArtifacts {
        image_path,
        data_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeatmapRenderer, SpatialAccumulator};
    use shuttle_core::{FrameSize, PixelPoint, Point2D};

    #[test]
    fn test_write_artifacts() {
        let court = CourtRegion::new(
            PixelPoint::new(0, 0),
            PixelPoint::new(100, 0),
            PixelPoint::new(0, 100),
            PixelPoint::new(100, 100),
            "green",
        )
        .unwrap();
        let mut acc = SpatialAccumulator::new(court.clone());
        for i in 0..12 {
            let rally = if i < 6 { Some(1) } else { None };
            acc.record(Point2D::new(0.5, 0.5), FrameSize::new(100, 100), i, i as f64, rally);
        }

        let renderer = HeatmapRenderer::default();
        let render = renderer.render(&court, acc.samples()).unwrap().unwrap();
        let rallies = vec![RallyBoundary {
            rally_id: 1,
            start_frame: 0,
            end_frame: 5,
            start_time: 0.0,
            end_time: 5.0,
            shot_count: 2,
        }];
        let data = HeatmapData::new("s1", &court, renderer.config(), &render, acc.samples(), rallies);

        let dir = std::env::temp_dir().join(format!("shuttle-heatmap-{}", uuid::Uuid::new_v4()));
        let artifacts = write_artifacts(&dir, "s1", &render, &data).unwrap();

        assert!(artifacts.image_path.ends_with("s1_heatmap.png"));
        let decoded = image::open(&artifacts.image_path).unwrap();
        assert_eq!(decoded.width(), render.image.width());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&artifacts.data_path).unwrap()).unwrap();
        assert_eq!(json["sample_count"], 12);
        assert_eq!(json["rallies"][0]["rally_id"], 1);
        assert_eq!(json["samples"][0]["rally_id"], 1);
        assert!(json["samples"][11]["rally_id"].is_null());
        assert_eq!(json["busiest_zone"]["depth"], "mid");

        std::fs::remove_dir_all(&dir).ok();
    }
}
