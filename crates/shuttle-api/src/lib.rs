//! # Shuttle-API
//!
//! Session lifecycle for badminton swing analysis.
//!
//! A [`SessionRegistry`] owns one [`SessionContext`] per live session. Each
//! context decodes frames, asks its pose oracle for landmarks, runs the swing
//! analyzer and records foot positions for the court heatmap. Ending a session
//! produces a [`Report`] and writes the heatmap and timeline artifacts.
//!
//! [`SessionService`] wraps the registry for async callers and moves the
//! blocking work onto tokio's blocking pool.

pub mod config;
pub mod registry;
pub mod report;
pub mod service;
pub mod session;
pub mod telemetry;

pub use config::*;
pub use registry::*;
pub use report::*;
pub use service::*;
pub use session::*;
pub use telemetry::*;
