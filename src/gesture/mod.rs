//! Gesture segmentation from per-frame finger pose.

pub mod pose;
pub mod segmenter;

pub use pose::Pose;
pub use segmenter::{GestureSegmenter, SegmentEvent, SegmenterConfig};
