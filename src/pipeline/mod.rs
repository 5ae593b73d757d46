//! Frame-processing pipeline.
//!
//! The controller handles frames and commands on one loop thread. A polling
//! thread feeds it landmark frames through a bounded crossbeam channel, and
//! events come back on a second bounded channel.

pub mod controller;
pub mod error;
pub mod orchestrator;
pub mod station;
pub mod types;

pub use controller::PipelineController;
pub use error::{ErrorReporter, LogReporter, StationError};
pub use orchestrator::{ControllerStation, LoopInput, Pipeline, PipelineConfig, PipelineHandle};
pub use station::{Station, StationRunner};
pub use types::{Command, PipelineEvent, Snapshot};
