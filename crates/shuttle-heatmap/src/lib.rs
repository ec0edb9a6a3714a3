//! # Shuttle-Heatmap
//!
//! Where on court the player stands, accumulated over a session.
//!
//! ## Pipeline
//!
//! 1. **Accumulate** - ankle midpoints inside the court, tagged with the open rally
//! 2. **Unwarp** - perspective transform from the camera view onto a square grid
//! 3. **Bin and smooth** - 2D histogram, Gaussian blur, normalized intensity
//! 4. **Render** - jet color map, court markings, busiest zone, legend and stats
//! 5. **Export** - PNG plus a JSON document with samples and rally boundaries
//!
//! Nothing is rendered below [`DEFAULT_MIN_SAMPLES`] samples.

pub mod accumulator;
pub mod artifact;
pub mod colormap;
pub mod histogram;
pub mod render;

pub use accumulator::*;
pub use artifact::*;
pub use colormap::*;
pub use histogram::*;
pub use render::*;
