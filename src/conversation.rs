//! Conversation log: committed words in commit order.

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Conversation {
    words: Vec<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed word. Empty or whitespace-only words are refused.
    pub fn append(&mut self, word: String) -> bool {
        if word.trim().is_empty() {
            return false;
        }
        self.words.push(word);
        true
    }

    /// Remove every entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.words.len();
        self.words.clear();
        removed
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn last(&self) -> Option<&str> {
        self.words.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// One word per line.
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for word in &self.words {
            out.push_str(word);
            out.push('\n');
        }
        out
    }

    /// JSON array of strings.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.words)?)
    }
}

impl From<Vec<String>> for Conversation {
    fn from(words: Vec<String>) -> Self {
        let mut conversation = Self::new();
        for word in words {
            conversation.append(word);
        }
        conversation
    }
}

impl From<Conversation> for Vec<String> {
    fn from(conversation: Conversation) -> Self {
        conversation.words
    }
}
