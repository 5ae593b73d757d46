//! Gesture segmentation: pose debounce, stroke boundaries and idle reset.

use crate::defaults;
use crate::gesture::pose::Pose;
use crate::landmark::{HandObservation, Handedness, LandmarkFrame};
use crate::stroke::Point2;
use tracing::debug;

/// Timing parameters for the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Consecutive frames a new pose must persist before it takes effect.
    pub debounce_frames: u32,
    /// Time without a hand after which the pose resets to idle.
    pub idle_timeout_ms: u64,
    /// How long an open palm must be held to complete the word.
    pub word_complete_dwell_ms: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            debounce_frames: defaults::DEBOUNCE_FRAMES,
            idle_timeout_ms: defaults::IDLE_TIMEOUT_MS,
            word_complete_dwell_ms: defaults::WORD_COMPLETE_DWELL_MS,
        }
    }
}

/// Output of one segmenter tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentEvent {
    NoOp,
    StrokeStart { point: Point2, timestamp_ms: u64 },
    StrokePoint { point: Point2, timestamp_ms: u64 },
    StrokeEnd { timestamp_ms: u64 },
    /// The open stroke was lost to a detection gap longer than the idle timeout.
    StrokeAborted { timestamp_ms: u64, idle_ms: u64 },
    WordComplete { timestamp_ms: u64 },
}

/// The hand currently allowed to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveHand {
    handedness: Handedness,
    tip: Option<Point2>,
}

impl ActiveHand {
    fn of(hand: &HandObservation) -> Self {
        Self {
            handedness: hand.handedness,
            tip: hand.index_tip().map(Point2::from),
        }
    }
}

/// Turns landmark frames into stroke and word-complete events.
///
/// One frame in, exactly one [`SegmentEvent`] out.
#[derive(Debug, Clone)]
pub struct GestureSegmenter {
    config: SegmenterConfig,
    stable: Pose,
    candidate: Pose,
    candidate_frames: u32,
    candidate_since_ms: u64,
    stroke_open: bool,
    palm_since_ms: Option<u64>,
    word_complete_fired: bool,
    last_hand_ms: Option<u64>,
    last_timestamp_ms: u64,
    active: Option<ActiveHand>,
}

impl GestureSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            stable: Pose::Idle,
            candidate: Pose::Idle,
            candidate_frames: 0,
            candidate_since_ms: 0,
            stroke_open: false,
            palm_since_ms: None,
            word_complete_fired: false,
            last_hand_ms: None,
            last_timestamp_ms: 0,
            active: None,
        }
    }

    /// Process one frame.
    pub fn process(&mut self, frame: &LandmarkFrame) -> SegmentEvent {
        // Timestamps that run backwards are clamped to the last one seen.
        let ts = frame.timestamp_ms.max(self.last_timestamp_ms);
        self.last_timestamp_ms = ts;

        if let Some(last_hand_ms) = self.last_hand_ms {
            let idle_ms = ts - last_hand_ms;
            if idle_ms > self.config.idle_timeout_ms {
                let aborted = self.expire();
                debug!(idle_ms, aborted, "Hand lost past idle timeout, pose reset");
                if aborted {
                    if frame.is_hand_present() {
                        self.last_hand_ms = Some(ts);
                    }
                    return SegmentEvent::StrokeAborted {
                        timestamp_ms: ts,
                        idle_ms,
                    };
                }
            }
        }

        let Some(hand) = self.select_hand(&frame.hands) else {
            return SegmentEvent::NoOp;
        };
        self.last_hand_ms = Some(ts);

        let tip = hand.index_tip().map(Point2::from);
        let raw = match (Pose::classify(&hand.fingers), tip) {
            (Pose::Drawing, None) => Pose::Idle,
            (pose, _) => pose,
        };
        let selected = ActiveHand::of(hand);

        let event = self.step(raw, tip, ts);

        if self.stable == Pose::Drawing || self.active.is_some() {
            self.active = Some(selected);
        }
        event
    }

    fn step(&mut self, raw: Pose, tip: Option<Point2>, ts: u64) -> SegmentEvent {
        if raw == self.candidate {
            self.candidate_frames = self.candidate_frames.saturating_add(1);
        } else {
            self.candidate = raw;
            self.candidate_frames = 1;
            self.candidate_since_ms = ts;
        }

        if self.dwell_elapsed(ts) {
            self.word_complete_fired = true;
            debug!(timestamp_ms = ts, "Open palm held, word complete");
            return SegmentEvent::WordComplete { timestamp_ms: ts };
        }

        if self.candidate != self.stable && self.candidate_frames >= self.config.debounce_frames {
            return self.transition(tip, ts);
        }

        match (self.stable, raw, tip) {
            (Pose::Drawing, Pose::Drawing, Some(point)) if self.stroke_open => {
                SegmentEvent::StrokePoint {
                    point,
                    timestamp_ms: ts,
                }
            }
            // Still drawing after the stroke was cleared: start over.
            (Pose::Drawing, Pose::Drawing, Some(point)) => {
                self.stroke_open = true;
                SegmentEvent::StrokeStart {
                    point,
                    timestamp_ms: ts,
                }
            }
            _ => SegmentEvent::NoOp,
        }
    }

    fn transition(&mut self, tip: Option<Point2>, ts: u64) -> SegmentEvent {
        let previous = self.stable;
        self.stable = self.candidate;
        debug!(from = %previous, to = %self.stable, "Pose changed");

        if self.stable == Pose::WordComplete {
            self.palm_since_ms = Some(self.candidate_since_ms);
            self.word_complete_fired = false;
        } else {
            self.palm_since_ms = None;
        }

        if previous == Pose::Drawing && self.stroke_open {
            self.stroke_open = false;
            return SegmentEvent::StrokeEnd { timestamp_ms: ts };
        }

        match (self.stable, tip) {
            (Pose::Drawing, Some(point)) => {
                self.stroke_open = true;
                SegmentEvent::StrokeStart {
                    point,
                    timestamp_ms: ts,
                }
            }
            (Pose::WordComplete, _) if self.dwell_elapsed(ts) => {
                self.word_complete_fired = true;
                SegmentEvent::WordComplete { timestamp_ms: ts }
            }
            _ => SegmentEvent::NoOp,
        }
    }

    fn dwell_elapsed(&self, ts: u64) -> bool {
        match self.palm_since_ms {
            Some(since) if self.stable == Pose::WordComplete && !self.word_complete_fired => {
                ts.saturating_sub(since) >= self.config.word_complete_dwell_ms
            }
            _ => false,
        }
    }

    /// Pick the hand allowed to draw this frame.
    ///
    /// The active hand keeps drawing while it is visible: matched by
    /// handedness when labeled, else by the nearest fingertip within
    /// [`defaults::MAX_TIP_JUMP`]. While a stroke is open no other hand is
    /// considered, so a missing active hand counts as no hand at all.
    /// Otherwise the most confident detection wins, ties going to the
    /// earliest listed.
    fn select_hand<'a>(&self, hands: &'a [HandObservation]) -> Option<&'a HandObservation> {
        if let Some(active) = self.active {
            let tracked = if active.handedness != Handedness::Unknown {
                hands.iter().find(|h| h.handedness == active.handedness)
            } else {
                active
                    .tip
                    .and_then(|last| nearest_tip(hands, last, defaults::MAX_TIP_JUMP))
            };
            if tracked.is_some() || self.stroke_open {
                return tracked;
            }
        }

        hands.iter().fold(None, |best: Option<&HandObservation>, hand| match best {
            Some(b) if hand.confidence > b.confidence => Some(hand),
            Some(b) => Some(b),
            None => Some(hand),
        })
    }

    /// Reset to idle after a long detection gap. Returns true if a stroke was open.
    fn expire(&mut self) -> bool {
        let aborted = self.stroke_open;
        self.reset();
        aborted
    }

    /// Drop the open stroke. The pose is kept; continued drawing starts a new stroke.
    pub fn cancel_stroke(&mut self) {
        self.stroke_open = false;
    }

    /// Return to the initial idle state.
    pub fn reset(&mut self) {
        let config = self.config;
        let last_timestamp_ms = self.last_timestamp_ms;
        *self = Self::new(config);
        self.last_timestamp_ms = last_timestamp_ms;
    }

    pub fn pose(&self) -> Pose {
        self.stable
    }

    pub fn is_stroke_open(&self) -> bool {
        self.stroke_open
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }
}

fn nearest_tip(hands: &[HandObservation], last: Point2, max_jump: f32) -> Option<&HandObservation> {
    hands
        .iter()
        .filter_map(|h| h.index_tip().map(|tip| (h, Point2::from(tip).distance_to(&last))))
        .filter(|(_, d)| *d <= max_jump)
        .fold(None, |best: Option<(&HandObservation, f32)>, (hand, d)| match best {
            Some((_, best_d)) if d >= best_d => best,
            _ => Some((hand, d)),
        })
        .map(|(hand, _)| hand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{FingerStates, Landmark};

    fn config(debounce_frames: u32) -> SegmenterConfig {
        SegmenterConfig {
            debounce_frames,
            idle_timeout_ms: 500,
            word_complete_dwell_ms: 300,
        }
    }

    fn hand(fingers: FingerStates, x: f32, y: f32) -> HandObservation {
        HandObservation::at_fingertip(Landmark::new(x, y), fingers)
    }

    fn drawing(ts: u64, x: f32) -> LandmarkFrame {
        LandmarkFrame::with_hand(ts, hand(FingerStates::pointing(), x, 0.5))
    }

    fn fist(ts: u64) -> LandmarkFrame {
        LandmarkFrame::with_hand(ts, hand(FingerStates::fist(), 0.5, 0.5))
    }

    fn palm(ts: u64) -> LandmarkFrame {
        LandmarkFrame::with_hand(ts, hand(FingerStates::open_palm(), 0.5, 0.5))
    }

    #[test]
    fn test_stroke_start_point_end_without_debounce() {
        let mut seg = GestureSegmenter::new(config(1));

        assert!(matches!(
            seg.process(&drawing(0, 0.1)),
            SegmentEvent::StrokeStart { timestamp_ms: 0, .. }
        ));
        assert!(matches!(
            seg.process(&drawing(33, 0.2)),
            SegmentEvent::StrokePoint { timestamp_ms: 33, .. }
        ));
        assert_eq!(
            seg.process(&fist(66)),
            SegmentEvent::StrokeEnd { timestamp_ms: 66 }
        );
        assert_eq!(seg.process(&fist(99)), SegmentEvent::NoOp);
    }

    #[test]
    fn test_debounce_delays_stroke_start() {
        let mut seg = GestureSegmenter::new(config(3));

        assert_eq!(seg.process(&drawing(0, 0.1)), SegmentEvent::NoOp);
        assert_eq!(seg.process(&drawing(33, 0.2)), SegmentEvent::NoOp);
        match seg.process(&drawing(66, 0.3)) {
            SegmentEvent::StrokeStart { point, .. } => assert_eq!(point, Point2::new(0.3, 0.5)),
            other => panic!("Expected StrokeStart, got {:?}", other),
        }
    }

    #[test]
    fn test_single_frame_jitter_does_not_end_stroke() {
        let mut seg = GestureSegmenter::new(config(3));
        for i in 0..3 {
            seg.process(&drawing(i * 33, 0.1));
        }
        assert!(seg.is_stroke_open());

        assert_eq!(seg.process(&fist(100)), SegmentEvent::NoOp);
        assert!(matches!(
            seg.process(&drawing(133, 0.2)),
            SegmentEvent::StrokePoint { .. }
        ));
        assert!(seg.is_stroke_open());
    }

    #[test]
    fn test_idle_frames_never_open_stroke() {
        let mut seg = GestureSegmenter::new(config(1));
        for i in 0..20 {
            assert_eq!(seg.process(&fist(i * 33)), SegmentEvent::NoOp);
        }
        assert!(!seg.is_stroke_open());
    }

    #[test]
    fn test_open_palm_ends_stroke_then_completes_word() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));
        seg.process(&drawing(33, 0.2));

        assert_eq!(
            seg.process(&palm(66)),
            SegmentEvent::StrokeEnd { timestamp_ms: 66 }
        );
        assert_eq!(seg.process(&palm(200)), SegmentEvent::NoOp);
        assert_eq!(
            seg.process(&palm(366)),
            SegmentEvent::WordComplete { timestamp_ms: 366 }
        );
    }

    #[test]
    fn test_word_complete_fires_once_per_hold() {
        let mut seg = GestureSegmenter::new(config(1));
        let events: Vec<_> = (0..30).map(|i| seg.process(&palm(i * 33))).collect();
        let fired = events
            .iter()
            .filter(|e| matches!(e, SegmentEvent::WordComplete { .. }))
            .count();
        assert_eq!(fired, 1);

        // Lower the palm, raise it again: a second hold fires again.
        seg.process(&fist(1000));
        let fired_again = (0..20)
            .map(|i| seg.process(&palm(1033 + i * 33)))
            .filter(|e| matches!(e, SegmentEvent::WordComplete { .. }))
            .count();
        assert_eq!(fired_again, 1);
    }

    #[test]
    fn test_dwell_measured_from_first_palm_frame() {
        let mut seg = GestureSegmenter::new(SegmenterConfig {
            debounce_frames: 3,
            idle_timeout_ms: 500,
            word_complete_dwell_ms: 100,
        });
        assert_eq!(seg.process(&palm(0)), SegmentEvent::NoOp);
        assert_eq!(seg.process(&palm(50)), SegmentEvent::NoOp);
        assert_eq!(
            seg.process(&palm(100)),
            SegmentEvent::WordComplete { timestamp_ms: 100 }
        );
    }

    #[test]
    fn test_short_gap_keeps_stroke() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));

        assert_eq!(
            seg.process(&LandmarkFrame::absent(200)),
            SegmentEvent::NoOp
        );
        assert!(matches!(
            seg.process(&drawing(400, 0.2)),
            SegmentEvent::StrokePoint { .. }
        ));
    }

    #[test]
    fn test_long_gap_aborts_stroke() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));
        seg.process(&drawing(33, 0.2));

        assert_eq!(seg.process(&LandmarkFrame::absent(300)), SegmentEvent::NoOp);
        assert_eq!(
            seg.process(&LandmarkFrame::absent(534)),
            SegmentEvent::StrokeAborted {
                timestamp_ms: 534,
                idle_ms: 501
            }
        );
        assert_eq!(seg.pose(), Pose::Idle);
        assert!(!seg.is_stroke_open());
    }

    #[test]
    fn test_timestamp_gap_with_hand_aborts_stroke() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));

        assert!(matches!(
            seg.process(&drawing(2000, 0.2)),
            SegmentEvent::StrokeAborted { idle_ms: 2000, .. }
        ));
        // The hand is back: the next frame starts a fresh stroke.
        assert!(matches!(
            seg.process(&drawing(2033, 0.3)),
            SegmentEvent::StrokeStart { .. }
        ));
    }

    #[test]
    fn test_long_gap_without_stroke_is_silent() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&fist(0));
        assert_eq!(seg.process(&LandmarkFrame::absent(5000)), SegmentEvent::NoOp);
    }

    #[test]
    fn test_backwards_timestamp_is_clamped() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(100, 0.1));
        assert_eq!(
            seg.process(&drawing(50, 0.2)),
            SegmentEvent::StrokePoint {
                point: Point2::new(0.2, 0.5),
                timestamp_ms: 100
            }
        );
    }

    #[test]
    fn test_drawing_without_landmarks_is_idle() {
        let mut seg = GestureSegmenter::new(config(1));
        let frame = LandmarkFrame::with_hand(0, HandObservation::new(vec![], FingerStates::pointing()));
        assert_eq!(seg.process(&frame), SegmentEvent::NoOp);
        assert_eq!(seg.pose(), Pose::Idle);
    }

    #[test]
    fn test_cancel_stroke_restarts_on_next_drawing_frame() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));
        seg.cancel_stroke();

        assert!(matches!(
            seg.process(&drawing(33, 0.2)),
            SegmentEvent::StrokeStart { timestamp_ms: 33, .. }
        ));
    }

    #[test]
    fn test_highest_confidence_hand_selected() {
        let mut seg = GestureSegmenter::new(config(1));
        let frame = LandmarkFrame::new(
            0,
            vec![
                hand(FingerStates::fist(), 0.1, 0.1).with_confidence(0.5),
                hand(FingerStates::pointing(), 0.9, 0.9).with_confidence(0.8),
            ],
        );
        match seg.process(&frame) {
            SegmentEvent::StrokeStart { point, .. } => assert_eq!(point, Point2::new(0.9, 0.9)),
            other => panic!("Expected StrokeStart, got {:?}", other),
        }
    }

    #[test]
    fn test_confidence_tie_goes_to_first_hand() {
        let mut seg = GestureSegmenter::new(config(1));
        let frame = LandmarkFrame::new(
            0,
            vec![
                hand(FingerStates::pointing(), 0.1, 0.1).with_confidence(0.7),
                hand(FingerStates::pointing(), 0.9, 0.9).with_confidence(0.7),
            ],
        );
        match seg.process(&frame) {
            SegmentEvent::StrokeStart { point, .. } => assert_eq!(point, Point2::new(0.1, 0.1)),
            other => panic!("Expected StrokeStart, got {:?}", other),
        }
    }

    #[test]
    fn test_drawing_hand_keeps_priority_by_handedness() {
        let mut seg = GestureSegmenter::new(config(1));
        let right = |x| {
            hand(FingerStates::pointing(), x, 0.5)
                .with_handedness(Handedness::Right)
                .with_confidence(0.6)
        };
        seg.process(&LandmarkFrame::new(0, vec![right(0.2)]));

        // A more confident left hand appears; the right hand keeps drawing.
        let frame = LandmarkFrame::new(
            33,
            vec![
                hand(FingerStates::pointing(), 0.8, 0.8)
                    .with_handedness(Handedness::Left)
                    .with_confidence(0.99),
                right(0.25),
            ],
        );
        match seg.process(&frame) {
            SegmentEvent::StrokePoint { point, .. } => assert_eq!(point, Point2::new(0.25, 0.5)),
            other => panic!("Expected StrokePoint, got {:?}", other),
        }
    }

    #[test]
    fn test_unlabeled_hands_tracked_by_nearest_tip() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.2));

        let frame = LandmarkFrame::new(
            33,
            vec![
                hand(FingerStates::pointing(), 0.9, 0.1).with_confidence(0.99),
                hand(FingerStates::pointing(), 0.22, 0.5).with_confidence(0.5),
            ],
        );
        match seg.process(&frame) {
            SegmentEvent::StrokePoint { point, .. } => assert_eq!(point, Point2::new(0.22, 0.5)),
            other => panic!("Expected StrokePoint, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_drawing_hand_does_not_hand_over_stroke() {
        let mut seg = GestureSegmenter::new(config(1));
        let right = |x| hand(FingerStates::pointing(), x, 0.5).with_handedness(Handedness::Right);
        let left = |x| hand(FingerStates::pointing(), x, 0.5).with_handedness(Handedness::Left);

        seg.process(&LandmarkFrame::new(0, vec![right(0.1), left(0.9)]));
        seg.process(&LandmarkFrame::new(33, vec![right(0.12), left(0.9)]));

        // Right drops out for a frame; the left hand must not join the stroke.
        assert_eq!(
            seg.process(&LandmarkFrame::new(66, vec![left(0.9)])),
            SegmentEvent::NoOp
        );
        assert!(seg.is_stroke_open());

        match seg.process(&LandmarkFrame::new(99, vec![right(0.14), left(0.91)])) {
            SegmentEvent::StrokePoint { point, .. } => assert_eq!(point, Point2::new(0.14, 0.5)),
            other => panic!("Expected StrokePoint, got {:?}", other),
        }
    }

    #[test]
    fn test_other_hand_alone_lets_stroke_time_out() {
        let mut seg = GestureSegmenter::new(config(1));
        let right = |x| hand(FingerStates::pointing(), x, 0.5).with_handedness(Handedness::Right);
        let left = hand(FingerStates::pointing(), 0.9, 0.5).with_handedness(Handedness::Left);

        seg.process(&LandmarkFrame::new(0, vec![right(0.1)]));
        seg.process(&LandmarkFrame::new(33, vec![right(0.12)]));

        for ts in [100, 300, 500] {
            assert_eq!(
                seg.process(&LandmarkFrame::new(ts, vec![left.clone()])),
                SegmentEvent::NoOp
            );
        }
        assert_eq!(
            seg.process(&LandmarkFrame::new(600, vec![left.clone()])),
            SegmentEvent::StrokeAborted {
                timestamp_ms: 600,
                idle_ms: 567
            }
        );

        // With no stroke open, the remaining hand may take over.
        assert!(matches!(
            seg.process(&LandmarkFrame::new(633, vec![left])),
            SegmentEvent::StrokeStart { .. }
        ));
    }

    #[test]
    fn test_unlabeled_far_hand_is_not_the_drawing_hand() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));
        seg.process(&drawing(33, 0.12));

        assert_eq!(seg.process(&drawing(66, 0.95)), SegmentEvent::NoOp);
        assert!(seg.is_stroke_open());

        assert!(matches!(
            seg.process(&drawing(99, 0.14)),
            SegmentEvent::StrokePoint { .. }
        ));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut seg = GestureSegmenter::new(config(1));
        seg.process(&drawing(0, 0.1));
        seg.reset();
        assert_eq!(seg.pose(), Pose::Idle);
        assert!(!seg.is_stroke_open());
    }
}
