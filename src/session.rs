//! Session: the root state object owned by the pipeline controller.

use crate::conversation::Conversation;
use crate::defaults;
use crate::gesture::SegmenterConfig;
use crate::stroke::StrokeConfig;
use crate::word::WordAssembler;

/// Tunables for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub segmenter: SegmenterConfig,
    pub stroke: StrokeConfig,
    pub acceptance_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            stroke: StrokeConfig::default(),
            acceptance_threshold: defaults::ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Tracking state, current word, conversation and latest status text.
///
/// Mutated only by the controller loop.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    pub(crate) tracking: bool,
    pub(crate) word: WordAssembler,
    pub(crate) conversation: Conversation,
    pub(crate) status: String,
    pub(crate) last_letter: Option<char>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            tracking: false,
            word: WordAssembler::new(),
            conversation: Conversation::new(),
            status: defaults::STATUS_READY.to_string(),
            last_letter: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn word(&self) -> &WordAssembler {
        &self.word
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_letter(&self) -> Option<char> {
        self.last_letter
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}
