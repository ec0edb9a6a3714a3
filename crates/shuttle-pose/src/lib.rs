//! # Shuttle-Pose
//!
//! Narrow contract with the external pose-estimation capability.
//!
//! The engine never runs a model itself. Each session owns one
//! [`PoseOracle`] created by an [`OracleFactory`]; the oracle turns a decoded
//! frame into zero or one [`shuttle_core::PoseLandmarks`]. Frames arrive either
//! encoded (PNG/JPEG bytes) or as raw RGB buffers and are decoded here.
//!
//! [`ReplayOracle`] plays back landmarks recorded earlier, which is how
//! offline re-analysis and the test suites drive sessions.

pub mod frame;
pub mod oracle;
pub mod replay;

pub use frame::*;
pub use oracle::*;
pub use replay::*;
