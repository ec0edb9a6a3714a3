//! Fundamental types for the Shuttle analysis engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one analysis session (one uploaded video or live stream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Point in normalized frame coordinates (`[0, 1]` on both axes, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Scale to pixel coordinates of a frame (truncating, like a raster index)
    pub fn to_pixel(&self, frame: FrameSize) -> PixelPoint {
        PixelPoint::new(
            (self.x * frame.width as f64) as i32,
            (self.y * frame.height as f64) as i32,
        )
    }
}

/// Integer pixel position in a video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Pixel dimensions of a video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Named joints reported by the pose oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Joint {
    Nose = 0,
    LeftShoulder = 1,
    RightShoulder = 2,
    LeftElbow = 3,
    RightElbow = 4,
    LeftWrist = 5,
    RightWrist = 6,
    LeftHip = 7,
    RightHip = 8,
    LeftKnee = 9,
    RightKnee = 10,
    LeftAnkle = 11,
    RightAnkle = 12,
}

impl Joint {
    pub const COUNT: usize = 13;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One joint position with its visibility score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointSample {
    /// Normalized x (0.0..=1.0)
    pub x: f64,
    /// Normalized y (0.0..=1.0)
    pub y: f64,
    /// Visibility / confidence (0.0..=1.0)
    pub confidence: f64,
}

impl JointSample {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Full set of joints for one detected player in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmarks {
    pub joints: [JointSample; Joint::COUNT],
}

impl PoseLandmarks {
    pub fn new(joints: [JointSample; Joint::COUNT]) -> Self {
        Self { joints }
    }

    pub fn get(&self, joint: Joint) -> JointSample {
        self.joints[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, sample: JointSample) {
        self.joints[joint.index()] = sample;
    }

    pub fn point(&self, joint: Joint) -> Point2D {
        self.get(joint).point()
    }

    pub fn midpoint(&self, a: Joint, b: Joint) -> Point2D {
        self.point(a).midpoint(&self.point(b))
    }

    /// Axis-aligned bounds of all joints in normalized coordinates (min, max)
    pub fn bounds(&self) -> (Point2D, Point2D) {
        let mut min = Point2D::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

        for j in &self.joints {
            min.x = min.x.min(j.x);
            min.y = min.y.min(j.y);
            max.x = max.x.max(j.x);
            max.y = max.y.max(j.y);
        }

        (min, max)
    }

    /// Center of the joint bounding box
    pub fn center(&self) -> Point2D {
        let (min, max) = self.bounds();
        min.midpoint(&max)
    }

    /// Mean joint visibility
    pub fn mean_confidence(&self) -> f64 {
        self.joints.iter().map(|j| j.confidence).sum::<f64>() / Joint::COUNT as f64
    }
}

/// Which arm holds the racket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl Handedness {
    pub fn wrist(self) -> Joint {
        match self {
            Handedness::Right => Joint::RightWrist,
            Handedness::Left => Joint::LeftWrist,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Handedness::Right => Joint::RightElbow,
            Handedness::Left => Joint::LeftElbow,
        }
    }
}
