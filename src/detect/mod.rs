//! Edge Detection Module
//!
//! A pure, deterministic Canny edge detector and the pipeline that wraps it.
//! Nothing in here performs I/O or holds shared state: given identical input
//! bytes and parameters the output edge map and score are always identical,
//! so the detector can run on any number of worker threads in parallel
//! across different orders.
//!
//! ## Submodules
//! - **`grid`**: Row-major 2D grids, the data the stages operate on.
//! - **`canny`**: The six detection stages (greyscale, smoothing, gradient,
//!   non-maximum suppression, double threshold, hysteresis).
//! - **`pipeline`**: Decode, resolution normalization, scoring, and PNG
//!   encoding around the detector.

pub mod canny;
pub mod grid;
pub mod pipeline;
