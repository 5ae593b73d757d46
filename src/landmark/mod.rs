//! Hand landmark input: frame types and the source abstraction.

pub mod frame;
pub mod source;

pub use frame::{Finger, FingerStates, HandObservation, Handedness, Landmark, LandmarkFrame};
pub use source::{JsonlLandmarkSource, LandmarkSource, MockLandmarkSource};
