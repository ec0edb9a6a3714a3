//! # Shuttle-Motion
//!
//! Turns per-frame body samples into racket-sport shots and rallies.
//!
//! ## Pipeline
//!
//! 1. **Features** - velocity, direction and position predicates from the
//!    rolling motion history (`shuttle-core`)
//! 2. **Swing detection** - overhead arc detector, then a single-frame fallback
//! 3. **Shot classification** - swing label and velocity to shot type and confidence
//! 4. **Cooldown** - later frames of the same swing become follow-through
//! 5. **Rallies** - accepted shots grouped until a gap of inactivity
//!
//! [`SwingAnalyzer`] runs the whole pipeline for one session.
//! [`ExerciseTracker`] counts reps for the exercise challenges.

pub mod analyzer;
pub mod cooldown;
pub mod exercise;
pub mod rally;
pub mod shot;
pub mod swing;

pub use analyzer::*;
pub use cooldown::*;
pub use exercise::*;
pub use rally::*;
pub use shot::*;
pub use swing::*;
