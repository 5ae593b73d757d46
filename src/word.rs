//! Word assembly from accepted letters.

use crate::conversation::Conversation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordState {
    /// No letters yet.
    #[default]
    Idle,
    Building,
}

/// State machine for the word currently being written.
#[derive(Debug, Clone, Default)]
pub struct WordAssembler {
    state: WordState,
    letters: Vec<char>,
}

impl WordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted letter.
    pub fn accept(&mut self, letter: char) {
        self.letters.push(letter);
        self.state = WordState::Building;
    }

    /// Discard the current word. Returns the number of letters dropped.
    pub fn restart(&mut self) -> usize {
        let dropped = self.letters.len();
        self.letters.clear();
        self.state = WordState::Idle;
        dropped
    }

    /// Move the current word into the conversation.
    ///
    /// Returns the committed word, or `None` (and changes nothing) when the
    /// word is empty.
    pub fn commit(&mut self, conversation: &mut Conversation) -> Option<String> {
        if self.letters.is_empty() {
            return None;
        }
        let word = self.text();
        if !conversation.append(word.clone()) {
            return None;
        }
        self.restart();
        Some(word)
    }

    pub fn text(&self) -> String {
        self.letters.iter().collect()
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn state(&self) -> WordState {
        self.state
    }
}
