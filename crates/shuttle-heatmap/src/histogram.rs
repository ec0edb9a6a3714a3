//! Canonical-grid histogram, Gaussian smoothing and court zones.
//!
//! Foot positions are unwarped from camera pixels onto a square grid where
//! the court's top-left corner is the origin and the bottom-right corner is
//! `(resolution, resolution)`. Rows run from the far end of the court (top of
//! the frame) to the near end.

use image::{ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use nalgebra::Point2;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use shuttle_core::{CourtRegion, PerspectiveTransform, Result};

use crate::accumulator::FootPositionSample;

pub const DEFAULT_GRID_RESOLUTION: usize = 50;
pub const DEFAULT_SIGMA: f64 = 2.0;

/// Raw sample counts on the canonical grid (rows × cols)
pub fn histogram(
    samples: &[FootPositionSample],
    transform: &PerspectiveTransform,
    resolution: usize,
) -> Array2<f64> {
    let mut grid = Array2::<f64>::zeros((resolution, resolution));
    if resolution == 0 {
        return grid;
    }

    for sample in samples {
        let p = Point2::new(sample.pixel.x as f64, sample.pixel.y as f64);
        if let Some((row, col)) = transform.apply(p).and_then(|q| cell(q, resolution)) {
            grid[[row, col]] += 1.0;
        }
    }

    grid
}

/// Grid cell of a canonical point; points on the far edges fall into the last cell
fn cell(point: Point2<f64>, resolution: usize) -> Option<(usize, usize)> {
    let size = resolution as f64;
    // Allow for rounding at the court boundary
    let slack = 1e-6;
    if !(-slack..=size + slack).contains(&point.x) || !(-slack..=size + slack).contains(&point.y) {
        return None;
    }

    let col = (point.x.max(0.0) as usize).min(resolution - 1);
    let row = (point.y.max(0.0) as usize).min(resolution - 1);
    Some((row, col))
}

/// Map the court's samples onto a `resolution × resolution` grid
pub fn court_histogram(
    court: &CourtRegion,
    samples: &[FootPositionSample],
    resolution: usize,
) -> Result<Array2<f64>> {
    let transform = court.canonical_transform(resolution as f64)?;
    Ok(histogram(samples, &transform, resolution))
}

/// Gaussian blur with replicated edges; `sigma <= 0` returns the grid unchanged
pub fn gaussian_smooth(grid: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if sigma <= 0.0 || grid.is_empty() {
        return grid.clone();
    }

    let (rows, cols) = grid.dim();
    let cells: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
            Luma([grid[[y as usize, x as usize]] as f32])
        });
    let blurred = gaussian_blur_f32(&cells, sigma as f32);

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        blurred.get_pixel(c as u32, r as u32)[0] as f64
    })
}

/// Scale to 0..=255 against the grid maximum
pub fn normalize(grid: &Array2<f64>) -> Array2<u8> {
    let max = grid.iter().cloned().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Array2::zeros(grid.dim());
    }
    grid.mapv(|v| ((v / max) * 255.0).round().clamp(0.0, 255.0) as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtDepth {
    Far,
    Mid,
    Near,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtSide {
    Left,
    Center,
    Right,
}

/// One cell of the 3 × 3 court split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourtZone {
    pub depth: CourtDepth,
    pub side: CourtSide,
}

impl CourtZone {
    const DEPTHS: [CourtDepth; 3] = [CourtDepth::Far, CourtDepth::Mid, CourtDepth::Near];
    const SIDES: [CourtSide; 3] = [CourtSide::Left, CourtSide::Center, CourtSide::Right];

    pub fn from_indices(row: usize, col: usize) -> Self {
        Self {
            depth: Self::DEPTHS[row.min(2)],
            side: Self::SIDES[col.min(2)],
        }
    }

    pub fn indices(&self) -> (usize, usize) {
        let row = Self::DEPTHS.iter().position(|d| *d == self.depth).unwrap_or(0);
        let col = Self::SIDES.iter().position(|s| *s == self.side).unwrap_or(0);
        (row, col)
    }

    /// Upper-case label, e.g. "NEAR LEFT"
    pub fn label(&self) -> String {
        let depth = match self.depth {
            CourtDepth::Far => "FAR",
            CourtDepth::Mid => "MID",
            CourtDepth::Near => "NEAR",
        };
        let side = match self.side {
            CourtSide::Left => "LEFT",
            CourtSide::Center => "CENTER",
            CourtSide::Right => "RIGHT",
        };
        format!("{depth} {side}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneCount {
    #[serde(flatten)]
    pub zone: CourtZone,
    pub samples: u32,
    /// Share of all samples, 0 when there are none
    pub fraction: f64,
}

/// Sample counts per zone from a raw (unsmoothed) histogram, far-left first
pub fn zone_counts(grid: &Array2<f64>) -> Vec<ZoneCount> {
    let (rows, cols) = grid.dim();
    let mut counts = [[0u32; 3]; 3];

    if rows > 0 && cols > 0 {
        for ((r, c), v) in grid.indexed_iter() {
            counts[(r * 3 / rows).min(2)][(c * 3 / cols).min(2)] += *v as u32;
        }
    }

    let total: u32 = counts.iter().flatten().sum();
    let mut zones = Vec::with_capacity(9);
    for (row, row_counts) in counts.iter().enumerate() {
        for (col, &samples) in row_counts.iter().enumerate() {
            zones.push(ZoneCount {
                zone: CourtZone::from_indices(row, col),
                samples,
                fraction: if total > 0 {
                    samples as f64 / total as f64
                } else {
                    0.0
                },
            });
        }
    }
    zones
}

/// Zone with the most samples; ties go to the first in far-left-first order
pub fn busiest_zone(zones: &[ZoneCount]) -> Option<ZoneCount> {
    zones
        .iter()
        .filter(|z| z.samples > 0)
        .fold(None, |best: Option<&ZoneCount>, z| match best {
            Some(b) if b.samples >= z.samples => Some(b),
            _ => Some(z),
        })
        .copied()
}
