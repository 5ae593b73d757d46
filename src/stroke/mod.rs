//! Stroke capture and trajectory normalization.

pub mod buffer;
pub mod geometry;

pub use buffer::{Discard, StrokeConfig, Trajectory, TrajectoryBuffer};
pub use geometry::Point2;
