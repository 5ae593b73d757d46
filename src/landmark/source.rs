use crate::error::{AirwriteError, Result};
use crate::landmark::frame::LandmarkFrame;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Trait for hand landmark providers (camera + hand-landmark model, replay file, mock).
///
/// This trait allows swapping implementations without touching the pipeline.
pub trait LandmarkSource: Send {
    /// Start producing frames (e.g. open the camera).
    fn start(&mut self) -> Result<()>;

    /// Stop producing frames and release the device.
    fn stop(&mut self) -> Result<()>;

    /// Return the next frame, if one is ready.
    ///
    /// # Returns
    /// - `Ok(Some(frame))` - a new frame
    /// - `Ok(None)` - no frame ready yet (live), or exhausted (finite)
    /// - `Err(_)` - the read failed
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>>;

    /// Returns true for sources with a fixed number of frames (files, scripts).
    ///
    /// Finite sources are never dropped under back-pressure, and `Ok(None)`
    /// from them means the stream has ended.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Replays landmark frames from JSON Lines, one [`LandmarkFrame`] per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub struct JsonlLandmarkSource {
    reader: Box<dyn BufRead + Send>,
    line_number: usize,
    started: bool,
}

impl JsonlLandmarkSource {
    /// Create from any buffered reader.
    pub fn from_reader(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            reader,
            line_number: 0,
            started: false,
        }
    }

    /// Open a recording on disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| AirwriteError::SourceUnavailable {
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
        Ok(Self::from_reader(Box::new(BufReader::new(file))))
    }
}

impl LandmarkSource for JsonlLandmarkSource {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        if !self.started {
            return Err(AirwriteError::SourceRead {
                message: "replay source read before start".to_string(),
            });
        }

        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| AirwriteError::SourceRead {
                    message: e.to_string(),
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|e| AirwriteError::FrameParse {
                    line: self.line_number,
                    message: e.to_string(),
                });
        }
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Mock landmark source for testing
#[derive(Debug, Clone, Default)]
pub struct MockLandmarkSource {
    frames: VecDeque<LandmarkFrame>,
    is_started: bool,
    finite: bool,
    should_fail_start: bool,
    failing_reads: Option<u32>,
}

impl MockLandmarkSource {
    /// Create a live-style mock that returns `Ok(None)` once its frames run out.
    pub fn new(frames: Vec<LandmarkFrame>) -> Self {
        Self {
            frames: frames.into(),
            ..Self::default()
        }
    }

    /// Configure the mock to behave as a finite recording.
    pub fn finite(mut self) -> Self {
        self.finite = true;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail every read after its frames are consumed.
    pub fn with_read_failure_after_frames(mut self) -> Self {
        self.failing_reads = Some(u32::MAX);
        self
    }

    /// Check if the source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl LandmarkSource for MockLandmarkSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(AirwriteError::SourceUnavailable {
                message: "mock camera unavailable".to_string(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(Some(frame));
        }
        match self.failing_reads {
            Some(remaining) if remaining > 0 => {
                self.failing_reads = Some(remaining - 1);
                Err(AirwriteError::SourceRead {
                    message: "mock read failure".to_string(),
                })
            }
            _ => Ok(None),
        }
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> Box<dyn BufRead + Send> {
        Box::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_jsonl_source_reads_frames_in_order() {
        let text = r#"{"timestamp_ms": 0}
{"timestamp_ms": 33, "hands": []}
"#;
        let mut source = JsonlLandmarkSource::from_reader(reader(text));
        source.start().unwrap();

        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, 0);
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, 33);
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.is_finite());
    }

    #[test]
    fn test_jsonl_source_skips_comments_and_blank_lines() {
        let text = "# recorded 2026-10-01\n\n{\"timestamp_ms\": 5}\n";
        let mut source = JsonlLandmarkSource::from_reader(reader(text));
        source.start().unwrap();

        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_ms, 5);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_jsonl_source_reports_bad_line_number() {
        let text = "{\"timestamp_ms\": 0}\n{\"hands\": []}\n";
        let mut source = JsonlLandmarkSource::from_reader(reader(text));
        source.start().unwrap();
        source.next_frame().unwrap();

        match source.next_frame() {
            Err(AirwriteError::FrameParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected FrameParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_jsonl_source_requires_start() {
        let mut source = JsonlLandmarkSource::from_reader(reader("{\"timestamp_ms\": 0}\n"));
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn test_open_missing_file_is_source_unavailable() {
        let result = JsonlLandmarkSource::open(Path::new("/nonexistent/airwrite/frames.jsonl"));
        assert!(matches!(
            result,
            Err(AirwriteError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_mock_source_start_failure() {
        let mut source = MockLandmarkSource::new(vec![]).with_start_failure();
        assert!(source.start().is_err());
        assert!(!source.is_started());
    }

    #[test]
    fn test_mock_source_read_failure_after_frames() {
        let mut source =
            MockLandmarkSource::new(vec![LandmarkFrame::absent(0)]).with_read_failure_after_frames();
        source.start().unwrap();

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().is_err());
    }
}
