//! Pipeline controller: owns the session and routes frames and commands.
//!
//! Single-threaded by construction. Every frame is fully processed
//! (segmentation, buffering and, on stroke end, classification) before the
//! next one is looked at. The threaded [`Pipeline`](crate::pipeline::Pipeline)
//! drives one controller from its loop thread; tests drive it directly.

use crate::error::Result;
use crate::gesture::{GestureSegmenter, SegmentEvent};
use crate::landmark::LandmarkFrame;
use crate::pipeline::types::{Command, PipelineEvent, Snapshot};
use crate::recognition::{AcceptancePolicy, LetterClassifier, RejectReason, Verdict};
use crate::session::{Session, SessionConfig};
use crate::stroke::{Discard, Point2, Trajectory, TrajectoryBuffer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Segmenter and buffer for one tracking run.
#[derive(Debug)]
struct Tracker {
    segmenter: GestureSegmenter,
    buffer: TrajectoryBuffer,
}

pub struct PipelineController {
    session: Session,
    tracker: Option<Tracker>,
    classifier: Arc<dyn LetterClassifier>,
    policy: AcceptancePolicy,
    events: Vec<PipelineEvent>,
    tracking_flag: Option<Arc<AtomicBool>>,
}

impl PipelineController {
    /// Create a stopped controller. Fails if the acceptance threshold is invalid.
    pub fn new(config: SessionConfig, classifier: Arc<dyn LetterClassifier>) -> Result<Self> {
        let policy = AcceptancePolicy::new(config.acceptance_threshold)?;
        Ok(Self {
            session: Session::new(config),
            tracker: None,
            classifier,
            policy,
            events: Vec::new(),
            tracking_flag: None,
        })
    }

    /// Mirror the tracking state into a flag shared with the landmark source thread.
    pub fn with_tracking_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        flag.store(self.session.tracking, Ordering::SeqCst);
        self.tracking_flag = Some(flag);
        self
    }

    pub fn handle_command(&mut self, command: Command) {
        debug!(?command, "Command");
        match command {
            Command::StartTracking => self.start_tracking(),
            Command::StopTracking => self.stop_tracking(),
            Command::ToggleCamera => self.toggle_camera(),
            Command::RestartWord => self.restart_word(),
            Command::CommitWord => {
                self.commit_word();
            }
            Command::ClearConversation => self.clear_conversation(),
            Command::ClearActiveStroke => self.clear_active_stroke(),
        }
    }

    /// Begin consuming frames with a fresh segmenter and buffer.
    pub fn start_tracking(&mut self) {
        self.set_tracking(true, "Tracking started");
    }

    /// Stop consuming frames. An in-flight stroke is dropped unclassified.
    pub fn stop_tracking(&mut self) {
        self.set_tracking(false, "Tracking stopped");
    }

    pub fn toggle_camera(&mut self) {
        if self.session.tracking {
            self.set_tracking(false, "Camera turned off");
        } else {
            self.set_tracking(true, "Camera turned on");
        }
    }

    fn set_tracking(&mut self, active: bool, status: &str) {
        if active {
            if self.tracker.is_none() {
                let config = *self.session.config();
                self.tracker = Some(Tracker {
                    segmenter: GestureSegmenter::new(config.segmenter),
                    buffer: TrajectoryBuffer::new(config.stroke),
                });
            }
        } else if let Some(tracker) = self.tracker.take()
            && tracker.buffer.is_open()
        {
            self.events.push(PipelineEvent::StrokeDiscarded {
                reason: "tracking stopped".to_string(),
            });
        }

        let changed = self.session.tracking != active;
        self.session.tracking = active;
        if let Some(flag) = &self.tracking_flag {
            flag.store(active, Ordering::SeqCst);
        }
        if changed {
            info!(active, "Tracking changed");
            self.events.push(PipelineEvent::TrackingChanged { active });
        }
        self.set_status(status);
    }

    /// Process one landmark frame. Ignored while tracking is off.
    pub fn process_frame(&mut self, frame: &LandmarkFrame) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };

        match tracker.segmenter.process(frame) {
            SegmentEvent::NoOp => {}
            SegmentEvent::StrokeStart {
                point,
                timestamp_ms,
            } => {
                tracker.buffer.begin(point, timestamp_ms);
                self.events.push(PipelineEvent::StrokeStarted);
            }
            SegmentEvent::StrokePoint {
                point,
                timestamp_ms,
            } => {
                tracker.buffer.add_point(point, timestamp_ms);
            }
            SegmentEvent::StrokeEnd { .. } => match tracker.buffer.finish() {
                Ok(trajectory) => self.classify(&trajectory),
                Err(discard) => self.discard(&discard),
            },
            SegmentEvent::StrokeAborted { idle_ms, .. } => {
                tracker.buffer.clear();
                self.discard(&Discard::Interrupted { idle_ms });
            }
            SegmentEvent::WordComplete { .. } => {
                self.commit_word();
            }
        }
    }

    fn classify(&mut self, trajectory: &Trajectory) {
        let candidate = match self.classifier.classify(trajectory) {
            Ok(candidate) => candidate.with_stroke(trajectory),
            Err(e) => {
                warn!(model = self.classifier.model_name(), "Classification failed: {}", e);
                self.events.push(PipelineEvent::ClassifierFailed {
                    message: e.to_string(),
                });
                self.set_status(format!("Recognition failed: {}", e));
                return;
            }
        };

        match self.policy.evaluate(candidate) {
            Verdict::Accepted(letter) => {
                self.session.word.accept(letter);
                self.session.last_letter = Some(letter);
                debug!(%letter, confidence = candidate.confidence, "Letter accepted");
                self.events.push(PipelineEvent::LetterAccepted {
                    letter,
                    confidence: candidate.confidence,
                    word: self.session.word.text(),
                });
                self.set_status(format!("Recognized: {}", letter));
            }
            Verdict::Rejected { candidate, reason } => {
                debug!(letter = %candidate.letter, confidence = candidate.confidence, %reason, "Letter rejected");
                self.events.push(PipelineEvent::LetterRejected {
                    letter: candidate.letter,
                    confidence: candidate.confidence,
                    raw_points: candidate.stroke.raw_points,
                    duration_ms: candidate.stroke.duration_ms,
                });
                let status = match reason {
                    RejectReason::LowConfidence => format!(
                        "Unrecognized gesture (best guess {} at {}%)",
                        candidate.letter,
                        (candidate.confidence * 100.0).round() as u32
                    ),
                    RejectReason::NotInAlphabet => format!(
                        "Unrecognized gesture ('{}' is not a letter)",
                        candidate.letter
                    ),
                    RejectReason::InvalidConfidence => {
                        warn!(
                            model = self.classifier.model_name(),
                            confidence = candidate.confidence,
                            "Classifier confidence outside [0, 1]"
                        );
                        "Unrecognized gesture (invalid confidence)".to_string()
                    }
                };
                self.set_status(status);
            }
        }
    }

    fn discard(&mut self, discard: &Discard) {
        debug!(%discard, "Stroke discarded");
        self.events.push(PipelineEvent::StrokeDiscarded {
            reason: discard.to_string(),
        });
        self.set_status(format!("Stroke discarded: {}", discard));
    }

    /// Drop the letters of the current word. The conversation is untouched.
    pub fn restart_word(&mut self) {
        self.session.word.restart();
        self.events.push(PipelineEvent::WordRestarted);
        self.set_status("Restarted current word");
    }

    /// Commit the current word to the conversation.
    ///
    /// Returns the committed word. An empty word is a silent no-op.
    pub fn commit_word(&mut self) -> Option<String> {
        let word = self.session.word.commit(&mut self.session.conversation)?;
        info!(word = %word, conversation_len = self.session.conversation.len(), "Word committed");
        self.events.push(PipelineEvent::WordCommitted {
            word: word.clone(),
            conversation_len: self.session.conversation.len(),
        });
        self.set_status(format!("Added word: {}", word));
        Some(word)
    }

    pub fn clear_conversation(&mut self) {
        let removed = self.session.conversation.clear();
        debug!(removed, "Conversation cleared");
        self.events.push(PipelineEvent::ConversationCleared);
        self.set_status("Conversation cleared");
    }

    /// Drop the open stroke. Drawing that continues starts a new stroke.
    pub fn clear_active_stroke(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.buffer.clear();
            tracker.segmenter.cancel_stroke();
        }
        self.set_status("Stroke cleared");
    }

    /// The landmark source failed for good. Tracking stops until restarted.
    pub fn source_failed(&mut self, message: &str) {
        warn!("Landmark source failed: {}", message);
        self.set_tracking(false, &format!("Source failure: {}", message));
        self.events.push(PipelineEvent::SourceFailed {
            message: message.to_string(),
        });
    }

    /// A finite landmark source has no more frames.
    pub fn source_finished(&mut self) {
        self.events.push(PipelineEvent::SourceFinished);
        self.set_status("Landmark source finished");
    }

    fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        self.session.set_status(status.clone());
        self.events.push(PipelineEvent::Status { text: status });
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tracking: self.session.tracking,
            status: self.session.status.clone(),
            current_word: self.session.word.text(),
            conversation: self.session.conversation.words().to_vec(),
            active_stroke: self.active_stroke().to_vec(),
            last_letter: self.session.last_letter,
        }
    }

    /// Raw points of the open stroke; empty when none is open.
    pub fn active_stroke(&self) -> &[Point2] {
        self.tracker
            .as_ref()
            .map(|t| t.buffer.snapshot())
            .unwrap_or_default()
    }

    /// Events produced since the last call, in order.
    pub fn take_events(&mut self) -> Vec<PipelineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
