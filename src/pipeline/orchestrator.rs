//! Threaded pipeline: landmark polling thread feeding the controller loop.

use crate::defaults;
use crate::error::{AirwriteError, Result};
use crate::landmark::{LandmarkFrame, LandmarkSource};
use crate::pipeline::controller::PipelineController;
use crate::pipeline::error::{ErrorReporter, LogReporter, StationError};
use crate::pipeline::station::{Station, StationRunner};
use crate::pipeline::types::{Command, PipelineEvent, Snapshot};
use crate::recognition::LetterClassifier;
use crate::session::SessionConfig;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub session: SessionConfig,
    /// Capacity of the loop input channel (frames and commands share it)
    pub input_buffer: usize,
    /// Capacity of the event channel
    pub event_buffer: usize,
    /// Source poll interval when no frame is ready
    pub poll_interval_ms: u64,
    /// Consecutive read errors before the source is declared failed
    pub max_source_errors: u32,
    /// Start tracking as soon as the pipeline starts
    pub start_tracking: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            input_buffer: defaults::INPUT_BUFFER,
            event_buffer: defaults::EVENT_BUFFER,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            max_source_errors: defaults::MAX_SOURCE_ERRORS,
            start_tracking: true,
        }
    }
}

/// Everything the controller loop consumes, in arrival order.
#[derive(Debug, Clone)]
pub enum LoopInput {
    Frame(LandmarkFrame),
    Command(Command),
    SourceFailed(String),
    SourceFinished,
}

/// Station wrapping the controller; publishes a snapshot after every input.
pub struct ControllerStation {
    controller: PipelineController,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl ControllerStation {
    pub fn new(controller: PipelineController, snapshot: Arc<RwLock<Snapshot>>) -> Self {
        Self {
            controller,
            snapshot,
        }
    }
}

impl Station for ControllerStation {
    type Input = LoopInput;
    type Output = Vec<PipelineEvent>;

    fn process(&mut self, input: LoopInput) -> std::result::Result<Option<Self::Output>, StationError> {
        match input {
            LoopInput::Frame(frame) => self.controller.process_frame(&frame),
            LoopInput::Command(command) => self.controller.handle_command(command),
            LoopInput::SourceFailed(message) => self.controller.source_failed(&message),
            LoopInput::SourceFinished => self.controller.source_finished(),
        }

        let events = self.controller.take_events();
        if !events.is_empty() {
            match self.snapshot.write() {
                Ok(mut snapshot) => *snapshot = self.controller.snapshot(),
                Err(_) => {
                    return Err(StationError::Recoverable(
                        "snapshot lock poisoned".to_string(),
                    ));
                }
            }
        } else if self.controller.session().is_tracking() {
            // The trail grows on frames that emit no event.
            if let Ok(mut snapshot) = self.snapshot.write() {
                snapshot.active_stroke = self.controller.active_stroke().to_vec();
            }
        }

        Ok((!events.is_empty()).then_some(events))
    }

    fn name(&self) -> &'static str {
        "Controller"
    }

    fn shutdown(&mut self) {
        debug!(
            words = self.controller.session().conversation().len(),
            "Controller loop exiting"
        );
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    input_tx: Option<Sender<LoopInput>>,
    running: Arc<AtomicBool>,
    tracking: Arc<AtomicBool>,
    source_done: Arc<AtomicBool>,
    snapshot: Arc<RwLock<Snapshot>>,
    events: Receiver<Vec<PipelineEvent>>,
    runner: Option<StationRunner<ControllerStation>>,
    source_thread: Option<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Queue a command into the controller loop.
    pub fn send(&self, command: Command) -> Result<()> {
        let tx = self.input_tx.as_ref().ok_or(AirwriteError::PipelineStopped)?;
        tx.send(LoopInput::Command(command))
            .map_err(|_| AirwriteError::PipelineStopped)
    }

    pub fn start_tracking(&self) -> Result<()> {
        self.send(Command::StartTracking)
    }

    pub fn stop_tracking(&self) -> Result<()> {
        self.send(Command::StopTracking)
    }

    pub fn toggle_camera(&self) -> Result<()> {
        self.send(Command::ToggleCamera)
    }

    pub fn restart_word(&self) -> Result<()> {
        self.send(Command::RestartWord)
    }

    pub fn commit_word(&self) -> Result<()> {
        self.send(Command::CommitWord)
    }

    pub fn clear_conversation(&self) -> Result<()> {
        self.send(Command::ClearConversation)
    }

    pub fn clear_active_stroke(&self) -> Result<()> {
        self.send(Command::ClearActiveStroke)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        match self.snapshot.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Event batches, one per processed input that produced events.
    pub fn events(&self) -> &Receiver<Vec<PipelineEvent>> {
        &self.events
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    /// True once the landmark polling thread has exited.
    pub fn is_source_done(&self) -> bool {
        self.source_done.load(Ordering::SeqCst)
    }

    /// Stop both threads and return the final snapshot.
    ///
    /// Inputs already queued are processed before the loop exits.
    pub fn stop(mut self) -> Snapshot {
        self.running.store(false, Ordering::SeqCst);
        self.input_tx = None;

        if let Some(handle) = self.source_thread.take()
            && handle.join().is_err()
        {
            error!("Landmark source thread panicked");
        }
        if let Some(runner) = self.runner.take()
            && let Err(msg) = runner.join()
        {
            error!("{}", msg);
        }

        self.snapshot()
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Landmark pipeline: LandmarkSource → controller loop → event stream.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the controller loop and the landmark polling thread.
    ///
    /// The source is started and stopped by the polling thread following the
    /// session's tracking state.
    pub fn start(
        self,
        source: Box<dyn LandmarkSource>,
        classifier: Arc<dyn LetterClassifier>,
    ) -> Result<PipelineHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let tracking = Arc::new(AtomicBool::new(false));
        let source_done = Arc::new(AtomicBool::new(false));
        let snapshot = Arc::new(RwLock::new(Snapshot::default()));

        let controller = PipelineController::new(self.config.session, classifier)?
            .with_tracking_flag(tracking.clone());
        if let Ok(mut s) = snapshot.write() {
            *s = controller.snapshot();
        }

        let (input_tx, input_rx) = bounded(self.config.input_buffer.max(1));
        let (event_tx, event_rx) = bounded(self.config.event_buffer.max(1));

        if self.config.start_tracking {
            input_tx
                .send(LoopInput::Command(Command::StartTracking))
                .map_err(|_| AirwriteError::PipelineStopped)?;
        }

        let runner = StationRunner::spawn(
            ControllerStation::new(controller, snapshot.clone()),
            input_rx,
            event_tx,
            self.error_reporter.clone(),
        );

        let poller = SourcePoller {
            source,
            input_tx: input_tx.clone(),
            running: running.clone(),
            tracking: tracking.clone(),
            done: source_done.clone(),
            poll_interval: Duration::from_millis(self.config.poll_interval_ms.max(1)),
            max_errors: self.config.max_source_errors.max(1),
        };
        let source_thread = thread::spawn(move || poller.run());

        info!("Pipeline started");
        Ok(PipelineHandle {
            input_tx: Some(input_tx),
            running,
            tracking,
            source_done,
            snapshot,
            events: event_rx,
            runner: Some(runner),
            source_thread: Some(source_thread),
        })
    }
}

/// Polls the landmark source while tracking is on.
struct SourcePoller {
    source: Box<dyn LandmarkSource>,
    input_tx: Sender<LoopInput>,
    running: Arc<AtomicBool>,
    tracking: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
    poll_interval: Duration,
    max_errors: u32,
}

impl SourcePoller {
    fn run(mut self) {
        let finite = self.source.is_finite();
        let mut started = false;
        // Set after a failure; cleared once the controller has stopped tracking.
        let mut failed = false;
        let mut consecutive_errors: u32 = 0;
        let mut dropped: u64 = 0;

        while self.running.load(Ordering::SeqCst) {
            if !self.tracking.load(Ordering::SeqCst) {
                failed = false;
                if started {
                    self.stop_source();
                    started = false;
                }
                thread::sleep(self.poll_interval);
                continue;
            }
            if failed {
                thread::sleep(self.poll_interval);
                continue;
            }

            if !started {
                match self.source.start() {
                    Ok(()) => {
                        debug!("Landmark source started");
                        started = true;
                        consecutive_errors = 0;
                    }
                    Err(e) => {
                        failed = true;
                        if !self.report_failure(e.to_string()) {
                            break;
                        }
                        continue;
                    }
                }
            }

            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    consecutive_errors = 0;
                    if finite {
                        if self.input_tx.send(LoopInput::Frame(frame)).is_err() {
                            break;
                        }
                    } else {
                        match self.input_tx.try_send(LoopInput::Frame(frame)) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                dropped += 1;
                                debug!(dropped, "Controller behind, frame dropped");
                            }
                            Err(TrySendError::Disconnected(_)) => break,
                        }
                    }
                }
                Ok(None) if finite => {
                    info!("Landmark recording finished");
                    if self.input_tx.send(LoopInput::SourceFinished).is_err() {
                        warn!("Controller loop gone before source finished");
                    }
                    break;
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.max_errors {
                        self.stop_source();
                        started = false;
                        failed = true;
                        let message =
                            format!("{} consecutive read errors, last: {}", consecutive_errors, e);
                        if !self.report_failure(message) {
                            break;
                        }
                        continue;
                    }
                    thread::sleep(self.poll_interval);
                }
            }
        }

        if started {
            self.stop_source();
        }
        self.done.store(true, Ordering::SeqCst);
    }

    /// Returns false when the controller loop is gone.
    fn report_failure(&self, message: String) -> bool {
        error!("Landmark source failed: {}", message);
        self.input_tx.send(LoopInput::SourceFailed(message)).is_ok()
    }

    fn stop_source(&mut self) {
        if let Err(e) = self.source.stop() {
            warn!("Failed to stop landmark source: {}", e);
        }
    }
}
