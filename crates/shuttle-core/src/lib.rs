//! # Shuttle-Core
//!
//! Core types and utilities for the Shuttle racket-sport analysis engine:
//! joint landmarks, court geometry, classification thresholds and the
//! kinematic features computed from consecutive pose samples.

pub mod error;
pub mod geometry;
pub mod kinematics;
pub mod thresholds;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use kinematics::*;
pub use thresholds::*;
pub use types::*;
