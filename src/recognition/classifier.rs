use crate::defaults;
use crate::error::{AirwriteError, Result};
use crate::stroke::Trajectory;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Symbols a classifier may produce.
pub const ALPHABET: std::ops::RangeInclusive<char> = 'A'..='Z';

/// The stroke a candidate was classified from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrokeRef {
    /// Points captured before resampling.
    pub raw_points: usize,
    pub duration_ms: u64,
}

impl From<&Trajectory> for StrokeRef {
    fn from(trajectory: &Trajectory) -> Self {
        Self {
            raw_points: trajectory.raw_point_count,
            duration_ms: trajectory.duration_ms,
        }
    }
}

/// Classifier output for one trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterCandidate {
    pub letter: char,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Source stroke; filled in by the caller that owns the trajectory.
    pub stroke: StrokeRef,
}

impl LetterCandidate {
    pub fn new(letter: char, confidence: f32) -> Self {
        Self {
            letter,
            confidence,
            stroke: StrokeRef::default(),
        }
    }

    pub fn with_stroke(mut self, trajectory: &Trajectory) -> Self {
        self.stroke = StrokeRef::from(trajectory);
        self
    }
}

/// Trait for letter recognition from a normalized trajectory.
///
/// Implementations must be deterministic for a given trajectory and model,
/// and must not keep state across calls.
pub trait LetterClassifier: Send + Sync {
    /// Classify a closed, normalized stroke.
    fn classify(&self, trajectory: &Trajectory) -> Result<LetterCandidate>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;
}

/// Implement LetterClassifier for Arc<T> to allow sharing across sessions.
impl<T: LetterClassifier + ?Sized> LetterClassifier for Arc<T> {
    fn classify(&self, trajectory: &Trajectory) -> Result<LetterCandidate> {
        (**self).classify(trajectory)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Why a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    LowConfidence,
    NotInAlphabet,
    /// The classifier reported a confidence outside [0, 1].
    InvalidConfidence,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::LowConfidence => write!(f, "low confidence"),
            RejectReason::NotInAlphabet => write!(f, "not a letter"),
            RejectReason::InvalidConfidence => write!(f, "invalid confidence"),
        }
    }
}

/// Outcome of applying the acceptance policy to a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Accepted(char),
    Rejected {
        candidate: LetterCandidate,
        reason: RejectReason,
    },
}

/// Confidence threshold plus alphabet membership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptancePolicy {
    threshold: f32,
}

impl AcceptancePolicy {
    /// Create a policy. The threshold must lie within [0, 1].
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AirwriteError::ConfigInvalidValue {
                key: "recognition.acceptance_threshold".to_string(),
                message: format!("{} is outside [0, 1]", threshold),
            });
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Accept the candidate if it is a letter and confident enough.
    ///
    /// Lowercase letters are folded to uppercase. A confidence outside
    /// [0, 1] (NaN included) never passes.
    pub fn evaluate(&self, candidate: LetterCandidate) -> Verdict {
        if !(0.0..=1.0).contains(&candidate.confidence) {
            return Verdict::Rejected {
                candidate,
                reason: RejectReason::InvalidConfidence,
            };
        }
        let letter = candidate.letter.to_ascii_uppercase();
        if !ALPHABET.contains(&letter) {
            return Verdict::Rejected {
                candidate,
                reason: RejectReason::NotInAlphabet,
            };
        }
        if candidate.confidence >= self.threshold {
            Verdict::Accepted(letter)
        } else {
            Verdict::Rejected {
                candidate,
                reason: RejectReason::LowConfidence,
            }
        }
    }
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            threshold: defaults::ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Mock classifier for testing
///
/// Returns queued responses in order, then repeats the default response.
/// Clones share the call counter and the queue.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    model_name: String,
    response: LetterCandidate,
    queued: Arc<Mutex<VecDeque<LetterCandidate>>>,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockClassifier {
    /// Create a new mock classifier with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: LetterCandidate::new('A', 1.0),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, letter: char, confidence: f32) -> Self {
        self.response = LetterCandidate::new(letter, confidence);
        self
    }

    /// Queue responses returned before the default response.
    pub fn with_responses(self, responses: &[(char, f32)]) -> Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued.extend(responses.iter().map(|&(l, c)| LetterCandidate::new(l, c)));
        }
        self
    }

    /// Configure the mock to fail on classify
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of classify calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LetterClassifier for MockClassifier {
    fn classify(&self, _trajectory: &Trajectory) -> Result<LetterCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AirwriteError::Classification {
                message: "mock classification failure".to_string(),
            });
        }
        let next = self.queued.lock().ok().and_then(|mut q| q.pop_front());
        Ok(next.unwrap_or(self.response))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
