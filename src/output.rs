//! Terminal rendering of pipeline events.

use crate::pipeline::PipelineEvent;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Plain-text line for an event, or `None` for events not shown to the user.
pub fn format_event(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::Status { text } => Some(text.clone()),
        PipelineEvent::LetterAccepted { word, .. } => Some(format!("  word: {}", word)),
        PipelineEvent::WordCommitted {
            conversation_len, ..
        } => Some(format!("  conversation: {} word(s)", conversation_len)),
        PipelineEvent::StrokeStarted
        | PipelineEvent::StrokeDiscarded { .. }
        | PipelineEvent::LetterRejected { .. }
        | PipelineEvent::ClassifierFailed { .. }
        | PipelineEvent::WordRestarted
        | PipelineEvent::ConversationCleared
        | PipelineEvent::TrackingChanged { .. }
        | PipelineEvent::SourceFailed { .. }
        | PipelineEvent::SourceFinished => None,
    }
}

/// Print an event to stderr, colored when stderr is a terminal.
pub fn render_event(event: &PipelineEvent) {
    let Some(line) = format_event(event) else {
        return;
    };
    if !std::io::stderr().is_terminal() {
        eprintln!("{}", line);
        return;
    }

    match event {
        PipelineEvent::Status { text } if text.starts_with("Recognized") => {
            eprintln!("{}", line.green())
        }
        PipelineEvent::Status { text } if text.starts_with("Added word") => {
            eprintln!("{}", line.bold())
        }
        PipelineEvent::Status { text }
            if text.starts_with("Unrecognized") || text.starts_with("Stroke discarded") =>
        {
            eprintln!("{}", line.yellow())
        }
        PipelineEvent::Status { text }
            if text.starts_with("Source failure") || text.starts_with("Recognition failed") =>
        {
            eprintln!("{}", line.red())
        }
        PipelineEvent::Status { .. } => eprintln!("{}", line),
        _ => eprintln!("{}", line.dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_shown_verbatim() {
        let event = PipelineEvent::Status {
            text: "Recognized: A".to_string(),
        };
        assert_eq!(format_event(&event), Some("Recognized: A".to_string()));
    }

    #[test]
    fn test_letter_accepted_shows_word() {
        let event = PipelineEvent::LetterAccepted {
            letter: 'T',
            confidence: 0.9,
            word: "CAT".to_string(),
        };
        assert_eq!(format_event(&event), Some("  word: CAT".to_string()));
    }

    #[test]
    fn test_internal_events_hidden() {
        assert_eq!(format_event(&PipelineEvent::StrokeStarted), None);
        assert_eq!(format_event(&PipelineEvent::SourceFinished), None);
        assert_eq!(
            format_event(&PipelineEvent::TrackingChanged { active: true }),
            None
        );
    }

    #[test]
    fn test_render_does_not_panic() {
        render_event(&PipelineEvent::Status {
            text: "Source failure: gone".to_string(),
        });
        render_event(&PipelineEvent::WordRestarted);
    }
}
