//! Replay application entry point.
//!
//! Drives the threaded pipeline from a recorded landmark stream:
//! frames → segmenter → classifier → word → conversation

use crate::cli::ExportFormat;
use crate::config::Config;
use crate::conversation::Conversation;
use crate::landmark::JsonlLandmarkSource;
use crate::output::render_event;
use crate::pipeline::{Command, Pipeline, PipelineEvent, PipelineHandle};
use crate::recognition::{LetterClassifier, TemplateClassifier};
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, unbounded};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const EVENT_POLL: Duration = Duration::from_millis(50);
const COMMIT_WAIT: Duration = Duration::from_millis(500);

/// Options of the `replay` command that are not part of [`Config`].
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub frames: PathBuf,
    pub commit_on_end: bool,
    pub export: ExportFormat,
    pub interactive: bool,
    pub quiet: bool,
}

/// Run the replay command and print the conversation export to stdout.
pub fn run_replay(config: Config, options: ReplayOptions) -> Result<()> {
    info!(version = %crate::version_string(), frames = %options.frames.display(), "Starting replay");
    let classifier = build_classifier(&config)?;
    info!(model = classifier.model_name(), "Classifier ready");

    let source = JsonlLandmarkSource::open(&options.frames)
        .with_context(|| format!("Failed to open frames file {}", options.frames.display()))?;

    let handle = Pipeline::new(config.pipeline_config())
        .start(Box::new(source), classifier)
        .context("Failed to start pipeline")?;

    let commands = if options.interactive {
        Some(spawn_command_reader())
    } else {
        None
    };

    drive(&handle, commands.as_ref(), options.quiet)?;

    if options.commit_on_end {
        handle.commit_word().context("Failed to commit final word")?;
        wait_for_commit(&handle, options.quiet);
    }

    let snapshot = handle.stop();
    let conversation = Conversation::from(snapshot.conversation);
    match options.export {
        ExportFormat::Text => print!("{}", conversation.export_text()),
        ExportFormat::Json => println!("{}", conversation.export_json()?),
    }
    Ok(())
}

fn build_classifier(config: &Config) -> Result<Arc<dyn LetterClassifier>> {
    let classifier = match &config.recognition.templates {
        Some(path) => TemplateClassifier::load(path)
            .with_context(|| format!("Failed to load templates from {}", path.display()))?,
        None => TemplateClassifier::builtin().context("Built-in letter templates are invalid")?,
    };
    Ok(Arc::new(classifier))
}

/// Forward stdin lines as pipeline commands until stdin closes.
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
        }
        debug!("Command reader finished");
    });
    rx
}

/// Render events until the source is exhausted (and stdin closed, when
/// reading commands).
fn drive(handle: &PipelineHandle, commands: Option<&Receiver<Command>>, quiet: bool) -> Result<()> {
    let mut source_ended = false;
    let mut commands_closed = commands.is_none();

    loop {
        if let Some(rx) = commands {
            loop {
                match rx.try_recv() {
                    Ok(command) => handle.send(command).context("Pipeline stopped")?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        commands_closed = true;
                        break;
                    }
                }
            }
        }

        match handle.events().recv_timeout(EVENT_POLL) {
            Ok(batch) => {
                for event in &batch {
                    if !quiet {
                        render_event(event);
                    }
                    if let PipelineEvent::SourceFailed { message } = event {
                        warn!("Landmark source failed: {}", message);
                        source_ended = true;
                    }
                    if matches!(event, PipelineEvent::SourceFinished) {
                        source_ended = true;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                // The finish event can be dropped when the event channel is full.
                if handle.is_source_done() && handle.events().is_empty() {
                    source_ended = true;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if source_ended && commands_closed {
            break;
        }
    }
    Ok(())
}

fn wait_for_commit(handle: &PipelineHandle, quiet: bool) {
    while let Ok(batch) = handle.events().recv_timeout(COMMIT_WAIT) {
        let mut committed = false;
        for event in &batch {
            if !quiet {
                render_event(event);
            }
            committed |= matches!(event, PipelineEvent::WordCommitted { .. });
        }
        if committed {
            break;
        }
    }
}
