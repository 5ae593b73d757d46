//! Commands, events and snapshots exchanged with the controller loop.

use crate::error::AirwriteError;
use crate::stroke::Point2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// External commands queued into the controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartTracking,
    StopTracking,
    ToggleCamera,
    RestartWord,
    CommitWord,
    ClearConversation,
    ClearActiveStroke,
}

impl FromStr for Command {
    type Err = AirwriteError;

    /// Parse the short command words used on the interactive console.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Command::StartTracking),
            "stop" => Ok(Command::StopTracking),
            "toggle" | "camera" => Ok(Command::ToggleCamera),
            "restart" => Ok(Command::RestartWord),
            "commit" | "add" => Ok(Command::CommitWord),
            "clear" => Ok(Command::ClearConversation),
            "clear-stroke" | "clear-canvas" => Ok(Command::ClearActiveStroke),
            other => Err(AirwriteError::Other(format!("unknown command '{}'", other))),
        }
    }
}

/// Events published by the controller for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The status line changed.
    Status { text: String },
    StrokeStarted,
    StrokeDiscarded { reason: String },
    LetterAccepted {
        letter: char,
        confidence: f32,
        word: String,
    },
    /// A candidate failed the acceptance policy. Carries the source stroke's
    /// raw point count and duration.
    LetterRejected {
        letter: char,
        confidence: f32,
        raw_points: usize,
        duration_ms: u64,
    },
    ClassifierFailed { message: String },
    WordCommitted {
        word: String,
        conversation_len: usize,
    },
    WordRestarted,
    ConversationCleared,
    TrackingChanged { active: bool },
    SourceFailed { message: String },
    /// A finite landmark source reached its end.
    SourceFinished,
}

/// Point-in-time view of the session for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub tracking: bool,
    pub status: String,
    pub current_word: String,
    pub conversation: Vec<String>,
    /// Raw points of the open stroke, for trail rendering.
    pub active_stroke: Vec<Point2>,
    pub last_letter: Option<char>,
}
