//! Heatmap rendering.
//!
//! Samples are unwarped onto the canonical grid, binned, smoothed and colored,
//! then scaled to the output canvas. Court markings and the busiest zone are
//! drawn on top, and a footer holds the color legend and sample statistics.
//! The statistics are only lettered when a TrueType font is configured; they
//! are always present in the data artifact.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use ndarray::Array2;
use rusttype::{Font, Scale};
use serde::{Deserialize, Serialize};
use shuttle_core::{CourtRegion, Error, Result};

use crate::accumulator::{FootPositionSample, DEFAULT_MIN_SAMPLES};
use crate::colormap::{colorize, jet};
use crate::histogram::{
    busiest_zone, court_histogram, gaussian_smooth, normalize, zone_counts, ZoneCount,
    DEFAULT_GRID_RESOLUTION, DEFAULT_SIGMA,
};

pub const DEFAULT_CANVAS_WIDTH: u32 = 400;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 800;
const FOOTER_HEIGHT: u32 = 60;
const LABEL_PX: f32 = 11.0;
const STATS_PX: f32 = 16.0;
const LEGEND_HEIGHT: u32 = 10;
const MARGIN: i32 = 10;

const BACKGROUND: Rgb<u8> = Rgb([24, 24, 24]);
const LINE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([230, 230, 230]);

/// Badminton court proportions, metres
const COURT_WIDTH_M: f64 = 6.10;
const COURT_LENGTH_M: f64 = 13.40;
const SHORT_SERVICE_FROM_NET_M: f64 = 1.98;
const DOUBLES_LONG_SERVICE_FROM_BACK_M: f64 = 0.76;
const SINGLES_SIDELINE_INSET_M: f64 = 0.46;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Cells per side of the canonical grid
    pub grid_resolution: usize,
    /// Gaussian sigma in grid cells
    pub sigma: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub min_samples: usize,
    pub court_lines: bool,
    /// TrueType font for the footer labels; unlabeled when unset
    pub font_path: Option<PathBuf>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            sigma: DEFAULT_SIGMA,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            min_samples: DEFAULT_MIN_SAMPLES,
            court_lines: true,
            font_path: None,
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_resolution == 0 {
            return Err(Error::Config("heatmap grid_resolution must be positive".into()));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::Config("heatmap canvas must be non-empty".into()));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(Error::Config(format!(
                "heatmap sigma must be non-negative, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// A rendered heatmap and the numbers behind it
#[derive(Debug, Clone)]
pub struct HeatmapRender {
    pub image: RgbImage,
    /// Smoothed, normalized intensities on the canonical grid
    pub intensity: Array2<u8>,
    pub zones: Vec<ZoneCount>,
    pub busiest_zone: Option<ZoneCount>,
    pub sample_count: usize,
}

/// Load a TrueType/OpenType font for heatmap labels
pub fn load_font(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path)?;
    Font::try_from_vec(bytes)
        .ok_or_else(|| Error::Render(format!("{}: not a usable font", path.display())))
}

pub struct HeatmapRenderer {
    config: HeatmapConfig,
    font: Option<Font<'static>>,
}

impl HeatmapRenderer {
    /// A font that fails to load is logged and the footer stays unlabeled
    pub fn new(config: HeatmapConfig) -> Self {
        let font = config.font_path.as_deref().and_then(|path| match load_font(path) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(error = %e, "Heatmap labels disabled");
                None
            }
        });
        Self { config, font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Render the samples, or `None` when there are fewer than `min_samples`
    pub fn render(
        &self,
        court: &CourtRegion,
        samples: &[FootPositionSample],
    ) -> Result<Option<HeatmapRender>> {
        if samples.len() < self.config.min_samples {
            tracing::debug!(
                samples = samples.len(),
                required = self.config.min_samples,
                "Not enough foot positions for a heatmap"
            );
            return Ok(None);
        }
        self.config.validate()?;

        let raw = court_histogram(court, samples, self.config.grid_resolution)?;
        let zones = zone_counts(&raw);
        let busiest = busiest_zone(&zones);

        let intensity = normalize(&gaussian_smooth(&raw, self.config.sigma));
        let heat = imageops::resize(
            &colorize(&intensity),
            self.config.canvas_width,
            self.config.canvas_height,
            FilterType::Triangle,
        );

        let mut image = RgbImage::from_pixel(
            self.config.canvas_width,
            self.config.canvas_height + FOOTER_HEIGHT,
            BACKGROUND,
        );
        imageops::replace(&mut image, &heat, 0, 0);

        if self.config.court_lines {
            self.draw_court_lines(&mut image);
        }
        if let Some(zone) = &busiest {
            self.draw_zone_outline(&mut image, zone);
        }
        self.draw_footer(&mut image, samples.len(), busiest.as_ref());

        tracing::debug!(
            samples = samples.len(),
            busiest = busiest.map(|z| z.zone.label()).unwrap_or_default(),
            "Rendered heatmap"
        );

        Ok(Some(HeatmapRender {
            image,
            intensity,
            zones,
            busiest_zone: busiest,
            sample_count: samples.len(),
        }))
    }

    /// Canvas position of a court-relative point (`u` across, `v` along, both 0..=1)
    fn to_canvas(&self, u: f64, v: f64) -> (f32, f32) {
        let w = (self.config.canvas_width - 1) as f64;
        let h = (self.config.canvas_height - 1) as f64;
        ((u * w).round() as f32, (v * h).round() as f32)
    }

    /// Two pixels wide, the second pass below or right of the first
    fn court_line(&self, image: &mut RgbImage, from: (f64, f64), to: (f64, f64)) {
        let a = self.to_canvas(from.0, from.1);
        let b = self.to_canvas(to.0, to.1);
        let (dx, dy) = if (b.0 - a.0).abs() >= (b.1 - a.1).abs() {
            (0.0, 1.0)
        } else {
            (1.0, 0.0)
        };
        draw_line_segment_mut(image, a, b, LINE_COLOR);
        draw_line_segment_mut(image, (a.0 + dx, a.1 + dy), (b.0 + dx, b.1 + dy), LINE_COLOR);
    }

    fn draw_court_lines(&self, image: &mut RgbImage) {
        let short_service = SHORT_SERVICE_FROM_NET_M / COURT_LENGTH_M;
        let long_service = DOUBLES_LONG_SERVICE_FROM_BACK_M / COURT_LENGTH_M;
        let singles = SINGLES_SIDELINE_INSET_M / COURT_WIDTH_M;

        // Outer boundary
        self.court_line(image, (0.0, 0.0), (1.0, 0.0));
        self.court_line(image, (0.0, 1.0), (1.0, 1.0));
        self.court_line(image, (0.0, 0.0), (0.0, 1.0));
        self.court_line(image, (1.0, 0.0), (1.0, 1.0));

        // Net
        self.court_line(image, (0.0, 0.5), (1.0, 0.5));

        for v in [
            0.5 - short_service,
            0.5 + short_service,
            long_service,
            1.0 - long_service,
        ] {
            self.court_line(image, (0.0, v), (1.0, v));
        }

        for u in [singles, 1.0 - singles] {
            self.court_line(image, (u, 0.0), (u, 1.0));
        }

        // Centre lines run from each back line to its short service line
        self.court_line(image, (0.5, 0.0), (0.5, 0.5 - short_service));
        self.court_line(image, (0.5, 0.5 + short_service), (0.5, 1.0));
    }

    fn draw_zone_outline(&self, image: &mut RgbImage, zone: &ZoneCount) {
        let (row, col) = zone.zone.indices();
        let (x0, y0) = self.to_canvas(col as f64 / 3.0, row as f64 / 3.0);
        let (x1, y1) = self.to_canvas((col + 1) as f64 / 3.0, (row + 1) as f64 / 3.0);
        for inset in [4, 5] {
            let width = x1 as i32 - x0 as i32 - 2 * inset;
            let height = y1 as i32 - y0 as i32 - 2 * inset;
            if width < 1 || height < 1 {
                continue;
            }
            let rect = Rect::at(x0 as i32 + inset, y0 as i32 + inset)
                .of_size(width as u32 + 1, height as u32 + 1);
            draw_hollow_rect_mut(image, rect, jet(255));
        }
    }

    fn draw_footer(&self, image: &mut RgbImage, samples: usize, busiest: Option<&ZoneCount>) {
        let width = self.config.canvas_width as i32;
        let top = self.config.canvas_height as i32;

        // Legend: color bar from low to high intensity
        let bar_top = top + 8;
        let bar_width = (width - 2 * MARGIN).max(1);
        let steps = (bar_width - 1).max(1);
        for x in 0..bar_width {
            let level = (x * 255 / steps).min(255) as u8;
            let column = Rect::at(MARGIN + x, bar_top).of_size(1, LEGEND_HEIGHT);
            draw_filled_rect_mut(image, column, jet(level));
        }

        let Some(font) = &self.font else {
            return;
        };

        let label_y = bar_top + LEGEND_HEIGHT as i32 + 3;
        let label = Scale::uniform(LABEL_PX);
        draw_text_mut(image, TEXT_COLOR, MARGIN, label_y, label, font, "LOW");
        let (high_width, _) = text_size(label, font, "HIGH");
        draw_text_mut(image, TEXT_COLOR, width - MARGIN - high_width, label_y, label, font, "HIGH");

        let stats_y = label_y + LABEL_PX as i32 + 2;
        let stats = Scale::uniform(STATS_PX);
        let sample_label = format!("SAMPLES {samples}");
        draw_text_mut(image, TEXT_COLOR, MARGIN, stats_y, stats, font, &sample_label);

        let busiest_label = match busiest {
            Some(zone) => format!("BUSIEST {}", zone.zone.label()),
            None => "BUSIEST -".to_string(),
        };
        let (busiest_width, _) = text_size(stats, font, &busiest_label);
        draw_text_mut(
            image,
            TEXT_COLOR,
            width - MARGIN - busiest_width,
            stats_y,
            stats,
            font,
            &busiest_label,
        );
    }
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self::new(HeatmapConfig::default())
    }
}
