//! Per-frame hand landmark data delivered by a landmark source.

use serde::{Deserialize, Serialize};

/// Index of the index-finger tip in the 21-point hand landmark layout.
pub const INDEX_FINGER_TIP: usize = 8;

/// A landmark position. `x`/`y` are image-normalized; `z` is relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    /// Creates a landmark on the image plane (zero depth).
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// The five fingers of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// Extended (`true`) or flexed (`false`) state for each finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Index finger raised, the rest curled.
    pub fn pointing() -> Self {
        Self {
            index: true,
            ..Self::default()
        }
    }

    /// Every finger raised.
    pub fn open_palm() -> Self {
        Self {
            thumb: true,
            index: true,
            middle: true,
            ring: true,
            pinky: true,
        }
    }

    /// Every finger curled.
    pub fn fist() -> Self {
        Self::default()
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    pub fn all_extended(&self) -> bool {
        self.thumb && self.index && self.middle && self.ring && self.pinky
    }
}

/// Which hand a detection belongs to, when the detector reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

fn full_confidence() -> f32 {
    1.0
}

/// One detected hand within a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    /// Ordered landmark coordinates (21 points for the standard layout).
    pub landmarks: Vec<Landmark>,
    /// Per-finger extended/flexed state.
    pub fingers: FingerStates,
    /// Detection confidence (0.0 to 1.0).
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub handedness: Handedness,
}

impl HandObservation {
    /// Creates a hand observation with full confidence and unknown handedness.
    pub fn new(landmarks: Vec<Landmark>, fingers: FingerStates) -> Self {
        Self {
            landmarks,
            fingers,
            confidence: 1.0,
            handedness: Handedness::Unknown,
        }
    }

    /// Creates an observation carrying only the fingertip position.
    pub fn at_fingertip(tip: Landmark, fingers: FingerStates) -> Self {
        Self::new(vec![tip], fingers)
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    /// Returns the drawing fingertip.
    ///
    /// Uses the index tip of the standard layout, falling back to the last
    /// landmark for sources that only report a reduced set.
    pub fn index_tip(&self) -> Option<Landmark> {
        self.landmarks
            .get(INDEX_FINGER_TIP)
            .or_else(|| self.landmarks.last())
            .copied()
    }
}

/// Landmarks for one input frame. An empty `hands` list means no hand detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Capture time in milliseconds (monotonically non-decreasing).
    pub timestamp_ms: u64,
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

impl LandmarkFrame {
    /// Creates a frame with the given hands.
    pub fn new(timestamp_ms: u64, hands: Vec<HandObservation>) -> Self {
        Self {
            timestamp_ms,
            hands,
        }
    }

    /// Creates a "no hand detected" frame.
    pub fn absent(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, Vec::new())
    }

    /// Creates a frame with a single hand.
    pub fn with_hand(timestamp_ms: u64, hand: HandObservation) -> Self {
        Self::new(timestamp_ms, vec![hand])
    }

    pub fn is_hand_present(&self) -> bool {
        !self.hands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_tip_uses_standard_layout() {
        let mut landmarks: Vec<Landmark> = (0..21).map(|i| Landmark::new(i as f32, 0.0)).collect();
        landmarks[INDEX_FINGER_TIP] = Landmark::new(0.42, 0.24);
        let hand = HandObservation::new(landmarks, FingerStates::pointing());

        assert_eq!(hand.index_tip(), Some(Landmark::new(0.42, 0.24)));
    }

    #[test]
    fn test_index_tip_falls_back_to_last_landmark() {
        let hand = HandObservation::at_fingertip(Landmark::new(0.3, 0.7), FingerStates::pointing());
        assert_eq!(hand.index_tip(), Some(Landmark::new(0.3, 0.7)));
    }

    #[test]
    fn test_index_tip_none_without_landmarks() {
        let hand = HandObservation::new(vec![], FingerStates::pointing());
        assert_eq!(hand.index_tip(), None);
    }

    #[test]
    fn test_finger_states_presets() {
        assert!(FingerStates::open_palm().all_extended());
        assert!(!FingerStates::pointing().all_extended());
        assert!(FingerStates::pointing().is_extended(Finger::Index));
        assert!(!FingerStates::pointing().is_extended(Finger::Middle));
        assert!(!FingerStates::fist().is_extended(Finger::Index));
    }

    #[test]
    fn test_frame_deserializes_with_defaults() {
        let json = r#"{"timestamp_ms": 40, "hands": [
            {"landmarks": [{"x": 0.5, "y": 0.25}], "fingers": {"thumb": false, "index": true, "middle": false, "ring": false, "pinky": false}}
        ]}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.timestamp_ms, 40);
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].confidence, 1.0);
        assert_eq!(frame.hands[0].handedness, Handedness::Unknown);
        assert_eq!(frame.hands[0].landmarks[0].z, 0.0);
    }

    #[test]
    fn test_absent_frame_has_no_hands() {
        let frame: LandmarkFrame = serde_json::from_str(r#"{"timestamp_ms": 7}"#).unwrap();
        assert!(!frame.is_hand_present());
        assert_eq!(frame, LandmarkFrame::absent(7));
    }
}
