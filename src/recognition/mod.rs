//! Letter classification boundary and the built-in template classifier.

pub mod classifier;
pub mod template;

pub use classifier::{
    ALPHABET, AcceptancePolicy, LetterCandidate, LetterClassifier, MockClassifier, RejectReason,
    StrokeRef, Verdict,
};
pub use template::TemplateClassifier;
