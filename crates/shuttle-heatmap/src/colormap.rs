//! Intensity to color mapping.

use image::{Rgb, RgbImage};
use ndarray::Array2;

/// Jet color map: dark blue through cyan, yellow to dark red
pub fn jet(intensity: u8) -> Rgb<u8> {
    let t = intensity as f64 / 255.0;
    let channel = |center: f64| ((1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Color an intensity grid; rows become image rows
pub fn colorize(grid: &Array2<u8>) -> RgbImage {
    let (rows, cols) = grid.dim();
    RgbImage::from_fn(cols as u32, rows as u32, |x, y| jet(grid[[y as usize, x as usize]]))
}
