//! Court geometry: the user-defined playing-surface quadrilateral and the
//! perspective transform that unwarps it onto a canonical grid.

use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{FrameSize, PixelPoint};

/// Below this absolute shoelace area (px²) a quadrilateral is degenerate
const MIN_COURT_AREA: f64 = 1.0;

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_corners(min: PixelPoint, max: PixelPoint) -> Self {
        let x = min.x.min(max.x);
        let y = min.y.min(max.y);
        Self {
            x,
            y,
            width: (min.x.max(max.x) - x) as u32,
            height: (min.y.max(max.y) - y) as u32,
        }
    }

    /// The four corners followed by the center, as fractional pixel coordinates
    pub fn sample_points(&self) -> [(f64, f64); 5] {
        let x0 = self.x as f64;
        let y0 = self.y as f64;
        let x1 = x0 + self.width as f64;
        let y1 = y0 + self.height as f64;
        [
            (x0, y0),
            (x1, y0),
            (x0, y1),
            (x1, y1),
            ((x0 + x1) / 2.0, (y0 + y1) / 2.0),
        ]
    }
}

/// The playing surface as seen by the camera.
///
/// Corners are pixel positions in the source frame. Walking them in the order
/// top-left, top-right, bottom-right, bottom-left traces the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtRegion {
    pub top_left: PixelPoint,
    pub top_right: PixelPoint,
    pub bottom_left: PixelPoint,
    pub bottom_right: PixelPoint,
    /// Descriptive label of the court surface color (e.g. "green")
    pub color: String,
}

impl CourtRegion {
    /// Build a court region, rejecting self-intersecting or zero-area quads
    pub fn new(
        top_left: PixelPoint,
        top_right: PixelPoint,
        bottom_left: PixelPoint,
        bottom_right: PixelPoint,
        color: impl Into<String>,
    ) -> Result<Self> {
        let court = Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            color: color.into(),
        };
        court.validate()?;
        Ok(court)
    }

    /// Corners in boundary order: top-left, top-right, bottom-right, bottom-left
    pub fn polygon(&self) -> [PixelPoint; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Corners in the order they are usually reported: TL, TR, BL, BR
    pub fn corners(&self) -> [PixelPoint; 4] {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right]
    }

    fn polygon_f64(&self) -> [(f64, f64); 4] {
        self.polygon().map(|p| (p.x as f64, p.y as f64))
    }

    pub fn validate(&self) -> Result<()> {
        let poly = self.polygon_f64();

        let area = shoelace_area(&poly);
        if area.abs() < MIN_COURT_AREA {
            return Err(Error::InvalidCourt(format!(
                "corners enclose no area ({area:.1} px²)"
            )));
        }

        // Only the two pairs of opposite edges can cross in a quadrilateral
        for (a, b) in [(0usize, 2usize), (1, 3)] {
            let e1 = (poly[a], poly[(a + 1) % 4]);
            let e2 = (poly[b], poly[(b + 1) % 4]);
            if segments_intersect(e1.0, e1.1, e2.0, e2.1) {
                return Err(Error::InvalidCourt(
                    "corners form a self-intersecting quadrilateral".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Point-in-quadrilateral test; points on the boundary count as inside
    pub fn contains_point(&self, point: PixelPoint) -> bool {
        self.contains_xy(point.x as f64, point.y as f64)
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let poly = self.polygon_f64();
        let mut inside = false;

        for i in 0..4 {
            let a = poly[i];
            let b = poly[(i + 1) % 4];

            if on_segment(a, b, (x, y)) {
                return true;
            }

            if (a.1 > y) != (b.1 > y) {
                let x_cross = a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }

        inside
    }

    /// True when at least `threshold` of the box's four corners and center lie inside
    pub fn contains_bbox(&self, bbox: &PixelRect, threshold: f64) -> bool {
        let points = bbox.sample_points();
        let inside = points
            .iter()
            .filter(|(x, y)| self.contains_xy(*x, *y))
            .count();

        inside as f64 / points.len() as f64 >= threshold
    }

    pub fn bounding_rect(&self) -> PixelRect {
        let poly = self.polygon();
        let min_x = poly.iter().map(|p| p.x).min().unwrap_or(0);
        let min_y = poly.iter().map(|p| p.y).min().unwrap_or(0);
        let max_x = poly.iter().map(|p| p.x).max().unwrap_or(0);
        let max_y = poly.iter().map(|p| p.y).max().unwrap_or(0);

        PixelRect::from_corners(PixelPoint::new(min_x, min_y), PixelPoint::new(max_x, max_y))
    }

    /// Binary mask (rows × cols = height × width) with 255 inside the court, 0 elsewhere
    pub fn to_mask(&self, frame: FrameSize) -> Array2<u8> {
        let mut mask = Array2::<u8>::zeros((frame.height as usize, frame.width as usize));
        if frame.width == 0 || frame.height == 0 {
            return mask;
        }

        let rect = self.bounding_rect();
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.width as i32).min(frame.width as i32 - 1);
        let y1 = (rect.y + rect.height as i32).min(frame.height as i32 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.contains_xy(x as f64, y as f64) {
                    mask[[y as usize, x as usize]] = 255;
                }
            }
        }

        mask
    }

    /// Perspective transform mapping the court onto a `size × size` square
    /// with the top-left corner at the origin
    pub fn canonical_transform(&self, size: f64) -> Result<PerspectiveTransform> {
        let src = self.polygon().map(|p| Point2::new(p.x as f64, p.y as f64));
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ];
        PerspectiveTransform::from_quad(&src, &dst)
    }
}

/// Planar homography between two quadrilaterals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    matrix: Matrix3<f64>,
}

impl PerspectiveTransform {
    /// Solve the homography that maps each `src[i]` onto `dst[i]`
    pub fn from_quad(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Result<Self> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for i in 0..4 {
            let (x, y) = (src[i].x, src[i].y);
            let (u, v) = (dst[i].x, dst[i].y);

            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -x * u;
            a[(r, 7)] = -y * u;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -x * v;
            a[(r + 1, 7)] = -y * v;
            b[r + 1] = v;
        }

        let h = a
            .lu()
            .solve(&b)
            .ok_or_else(|| Error::Geometry("perspective system is singular".to_string()))?;

        if h.iter().any(|v| !v.is_finite()) {
            return Err(Error::Geometry(
                "perspective solution is not finite".to_string(),
            ));
        }

        let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        Ok(Self { matrix })
    }

    /// Map a point; `None` if it lands on the line at infinity
    pub fn apply(&self, point: Point2<f64>) -> Option<Point2<f64>> {
        let v = self.matrix * Vector3::new(point.x, point.y, 1.0);
        if v.z.abs() < 1e-12 {
            return None;
        }
        Some(Point2::new(v.x / v.z, v.y / v.z))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }
}

fn shoelace_area(poly: &[(f64, f64); 4]) -> f64 {
    let mut sum = 0.0;
    for i in 0..4 {
        let (x0, y0) = poly[i];
        let (x1, y1) = poly[(i + 1) % 4];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    cross(a, b, p).abs() < 1e-9
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}

fn segments_intersect(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), p4: (f64, f64)) -> bool {
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    on_segment(p3, p4, p1) || on_segment(p3, p4, p2) || on_segment(p1, p2, p3) || on_segment(p1, p2, p4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_court() -> CourtRegion {
        CourtRegion::new(
            PixelPoint::new(0, 0),
            PixelPoint::new(100, 0),
            PixelPoint::new(0, 100),
            PixelPoint::new(100, 100),
            "green",
        )
        .unwrap()
    }

    fn trapezoid_court() -> CourtRegion {
        CourtRegion::new(
            PixelPoint::new(200, 100),
            PixelPoint::new(440, 100),
            PixelPoint::new(60, 460),
            PixelPoint::new(580, 460),
            "blue",
        )
        .unwrap()
    }

    #[test]
    fn test_contains_point() {
        let court = square_court();
        assert!(court.contains_point(PixelPoint::new(50, 50)));
        assert!(!court.contains_point(PixelPoint::new(150, 50)));
    }

    #[test]
    fn test_boundary_counts_as_inside() {
        let court = square_court();
        assert!(court.contains_point(PixelPoint::new(0, 0)));
        assert!(court.contains_point(PixelPoint::new(100, 50)));
        assert!(!court.contains_point(PixelPoint::new(101, 50)));
    }

    #[test]
    fn test_trapezoid_containment() {
        let court = trapezoid_court();
        assert!(court.contains_point(PixelPoint::new(320, 300)));
        // Inside the bounding box but outside the slanted left edge
        assert!(!court.contains_point(PixelPoint::new(80, 120)));
    }

    #[test]
    fn test_self_intersecting_rejected() {
        // Bottom corners swapped produce a bow-tie
        let result = CourtRegion::new(
            PixelPoint::new(0, 0),
            PixelPoint::new(100, 0),
            PixelPoint::new(100, 100),
            PixelPoint::new(0, 100),
            "green",
        );
        assert!(matches!(result, Err(Error::InvalidCourt(_))));
    }

    #[test]
    fn test_degenerate_rejected() {
        let p = PixelPoint::new(10, 10);
        let result = CourtRegion::new(p, p, p, p, "none");
        assert!(matches!(result, Err(Error::InvalidCourt(_))));
    }

    #[test]
    fn test_contains_bbox() {
        let court = square_court();

        let fully_inside = PixelRect::new(10, 10, 20, 20);
        assert!(court.contains_bbox(&fully_inside, 1.0));

        // Left corners and center inside, right corners outside: 3/5
        let straddling = PixelRect::new(80, 10, 40, 20);
        assert!(court.contains_bbox(&straddling, 0.6));
        assert!(!court.contains_bbox(&straddling, 0.8));
    }

    #[test]
    fn test_bounding_rect() {
        let rect = trapezoid_court().bounding_rect();
        assert_eq!(rect, PixelRect::new(60, 100, 520, 360));
    }

    #[test]
    fn test_mask() {
        let court = square_court();
        let mask = court.to_mask(FrameSize::new(200, 150));

        assert_eq!(mask.dim(), (150, 200));
        assert_eq!(mask[[50, 50]], 255);
        assert_eq!(mask[[50, 150]], 0);
        assert_eq!(mask[[120, 50]], 0);
    }

    #[test]
    fn test_canonical_transform_maps_corners() {
        let court = trapezoid_court();
        let transform = court.canonical_transform(50.0).unwrap();

        let tl = transform.apply(Point2::new(200.0, 100.0)).unwrap();
        let br = transform.apply(Point2::new(580.0, 460.0)).unwrap();
        let bl = transform.apply(Point2::new(60.0, 460.0)).unwrap();

        assert!(tl.x.abs() < 1e-6 && tl.y.abs() < 1e-6);
        assert!((br.x - 50.0).abs() < 1e-6 && (br.y - 50.0).abs() < 1e-6);
        assert!(bl.x.abs() < 1e-6 && (bl.y - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_canonical_transform_interior() {
        let court = square_court();
        let transform = court.canonical_transform(50.0).unwrap();
        let center = transform.apply(Point2::new(50.0, 50.0)).unwrap();

        assert!((center.x - 25.0).abs() < 1e-6);
        assert!((center.y - 25.0).abs() < 1e-6);
    }
}
