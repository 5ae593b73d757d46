//! Default configuration constants for airwrite.
//!
//! Shared by the config file layer and the per-component config structs so
//! both agree on one set of numbers.

/// Consecutive frames a new pose must persist before the segmenter honors it.
///
/// Three frames at 30 fps is ~100ms, enough to reject single-frame detector
/// jitter without making stroke starts feel sluggish.
pub const DEBOUNCE_FRAMES: u32 = 3;

/// Hand-absent duration in milliseconds after which the pose resets to idle.
///
/// An open stroke interrupted for longer than this is aborted, not classified.
pub const IDLE_TIMEOUT_MS: u64 = 500;

/// How long an open palm must be held to signal "word complete" (milliseconds).
pub const WORD_COMPLETE_DWELL_MS: u64 = 800;

/// Minimum raw points a stroke needs to be eligible for classification.
pub const MIN_STROKE_POINTS: usize = 10;

/// Minimum stroke path length, in landmark coordinate units.
///
/// Landmark coordinates are normalized to the image (0.0 to 1.0), so 0.05 is
/// 5% of the frame width.
pub const MIN_PATH_LENGTH: f32 = 0.05;

/// Minimum stroke duration in milliseconds.
pub const MIN_STROKE_DURATION_MS: u64 = 150;

/// Number of points every trajectory is resampled to before classification.
pub const RESAMPLE_POINTS: usize = 32;

/// Side length of the square the longer bounding-box side is scaled to.
pub const REFERENCE_SIZE: f32 = 1.0;

/// Minimum classifier confidence for a letter to be accepted.
pub const ACCEPTANCE_THRESHOLD: f32 = 0.6;

/// Capacity of the controller's input channel (frames and commands).
pub const INPUT_BUFFER: usize = 64;

/// Capacity of the event channel consumed by the UI layer.
pub const EVENT_BUFFER: usize = 256;

/// Interval between landmark source polls when no frame is ready (milliseconds).
pub const POLL_INTERVAL_MS: u64 = 10;

/// Consecutive source read failures tolerated before the session is stopped.
pub const MAX_SOURCE_ERRORS: u32 = 10;

/// Status text shown before anything has happened.
pub const STATUS_READY: &str = "Ready";

/// Largest fingertip jump between frames (image-normalized) for an unlabeled
/// hand to still count as the drawing hand.
pub const MAX_TIP_JUMP: f32 = 0.2;
