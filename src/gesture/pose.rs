use crate::landmark::{Finger, FingerStates};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-frame pose signal derived from finger extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pose {
    #[default]
    Idle,
    Drawing,
    /// Open palm. Held long enough, it completes the current word.
    WordComplete,
}

impl Pose {
    /// Classify a hand posture.
    ///
    /// An open palm (all five fingers raised) stops drawing and never counts
    /// as drawing itself. The index finger raised with at least one other
    /// finger lowered draws. Everything else is idle.
    pub fn classify(fingers: &FingerStates) -> Self {
        if fingers.all_extended() {
            Pose::WordComplete
        } else if fingers.is_extended(Finger::Index) {
            Pose::Drawing
        } else {
            Pose::Idle
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pose::Idle => write!(f, "idle"),
            Pose::Drawing => write!(f, "drawing"),
            Pose::WordComplete => write!(f, "word-complete"),
        }
    }
}
