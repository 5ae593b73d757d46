use crate::defaults;
use crate::error::{AirwriteError, Result};
use crate::gesture::SegmenterConfig;
use crate::pipeline::PipelineConfig;
use crate::session::SessionConfig;
use crate::stroke::StrokeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub stroke: StrokeSection,
    pub recognition: RecognitionConfig,
    pub pipeline: PipelineSection,
}

/// Pose segmentation timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    pub debounce_frames: u32,
    pub idle_timeout_ms: u64,
    pub word_complete_dwell_ms: u64,
    /// Start tracking as soon as the pipeline starts
    pub start_on_launch: bool,
}

/// Stroke discard policy and normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrokeSection {
    pub min_points: usize,
    pub min_path_length: f32,
    pub min_duration_ms: u64,
    pub resample_points: usize,
    pub reference_size: f32,
}

/// Letter acceptance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    pub acceptance_threshold: f32,
    /// JSON template set; the built-in set is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,
}

/// Channel sizes and source polling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    pub input_buffer: usize,
    pub event_buffer: usize,
    pub poll_interval_ms: u64,
    pub max_source_errors: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            debounce_frames: defaults::DEBOUNCE_FRAMES,
            idle_timeout_ms: defaults::IDLE_TIMEOUT_MS,
            word_complete_dwell_ms: defaults::WORD_COMPLETE_DWELL_MS,
            start_on_launch: true,
        }
    }
}

impl Default for StrokeSection {
    fn default() -> Self {
        Self {
            min_points: defaults::MIN_STROKE_POINTS,
            min_path_length: defaults::MIN_PATH_LENGTH,
            min_duration_ms: defaults::MIN_STROKE_DURATION_MS,
            resample_points: defaults::RESAMPLE_POINTS,
            reference_size: defaults::REFERENCE_SIZE,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: defaults::ACCEPTANCE_THRESHOLD,
            templates: None,
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            input_buffer: defaults::INPUT_BUFFER,
            event_buffer: defaults::EVENT_BUFFER,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            max_source_errors: defaults::MAX_SOURCE_ERRORS,
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> AirwriteError {
    AirwriteError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AirwriteError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AirwriteError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(AirwriteError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - AIRWRITE_ACCEPTANCE_THRESHOLD → recognition.acceptance_threshold
    /// - AIRWRITE_IDLE_TIMEOUT_MS → tracking.idle_timeout_ms
    /// - AIRWRITE_TEMPLATES → recognition.templates
    ///
    /// Unparsable values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("AIRWRITE_ACCEPTANCE_THRESHOLD")
            && !value.is_empty()
        {
            match value.parse::<f32>() {
                Ok(threshold) => self.recognition.acceptance_threshold = threshold,
                Err(_) => warn!("Ignoring AIRWRITE_ACCEPTANCE_THRESHOLD={:?}: not a number", value),
            }
        }

        if let Ok(value) = std::env::var("AIRWRITE_IDLE_TIMEOUT_MS")
            && !value.is_empty()
        {
            match value.parse::<u64>() {
                Ok(ms) => self.tracking.idle_timeout_ms = ms,
                Err(_) => warn!("Ignoring AIRWRITE_IDLE_TIMEOUT_MS={:?}: not an integer", value),
            }
        }

        if let Ok(templates) = std::env::var("AIRWRITE_TEMPLATES")
            && !templates.is_empty()
        {
            self.recognition.templates = Some(PathBuf::from(templates));
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.recognition.acceptance_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(
                "recognition.acceptance_threshold",
                format!("{} is outside [0, 1]", threshold),
            ));
        }
        if self.tracking.debounce_frames == 0 {
            return Err(invalid("tracking.debounce_frames", "must be at least 1"));
        }
        if self.stroke.resample_points < 2 {
            return Err(invalid("stroke.resample_points", "must be at least 2"));
        }
        if self.stroke.reference_size.is_nan() || self.stroke.reference_size <= 0.0 {
            return Err(invalid("stroke.reference_size", "must be positive"));
        }
        if self.stroke.min_path_length.is_nan() || self.stroke.min_path_length < 0.0 {
            return Err(invalid("stroke.min_path_length", "must not be negative"));
        }
        if self.pipeline.input_buffer == 0 {
            return Err(invalid("pipeline.input_buffer", "must be at least 1"));
        }
        if self.pipeline.event_buffer == 0 {
            return Err(invalid("pipeline.event_buffer", "must be at least 1"));
        }
        if self.pipeline.max_source_errors == 0 {
            return Err(invalid("pipeline.max_source_errors", "must be at least 1"));
        }
        Ok(())
    }

    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            debounce_frames: self.tracking.debounce_frames,
            idle_timeout_ms: self.tracking.idle_timeout_ms,
            word_complete_dwell_ms: self.tracking.word_complete_dwell_ms,
        }
    }

    pub fn stroke_config(&self) -> StrokeConfig {
        StrokeConfig {
            min_points: self.stroke.min_points,
            min_path_length: self.stroke.min_path_length,
            min_duration_ms: self.stroke.min_duration_ms,
            resample_points: self.stroke.resample_points,
            reference_size: self.stroke.reference_size,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            segmenter: self.segmenter_config(),
            stroke: self.stroke_config(),
            acceptance_threshold: self.recognition.acceptance_threshold,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            session: self.session_config(),
            input_buffer: self.pipeline.input_buffer,
            event_buffer: self.pipeline.event_buffer,
            poll_interval_ms: self.pipeline.poll_interval_ms,
            max_source_errors: self.pipeline.max_source_errors,
            start_tracking: self.tracking.start_on_launch,
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AirwriteError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/airwrite/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("airwrite").join("config.toml"))
            .ok_or_else(|| AirwriteError::Other("could not determine config directory".to_string()))
    }
}
