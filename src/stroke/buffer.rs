//! Trajectory buffer: collects the active stroke and normalizes it on close.

use crate::defaults;
use crate::stroke::geometry::{self, Point2};
use thiserror::Error;
use tracing::debug;

/// Thresholds and normalization parameters for a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeConfig {
    /// Minimum raw points for a stroke to be classified.
    pub min_points: usize,
    /// Minimum path length in landmark units.
    pub min_path_length: f32,
    /// Minimum time between first and last point (milliseconds).
    pub min_duration_ms: u64,
    /// Points in the resampled trajectory handed to the classifier.
    pub resample_points: usize,
    /// Size the longer bounding-box side is scaled to.
    pub reference_size: f32,
}

impl Default for StrokeConfig {
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

/// Why a stroke never reached the classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Discard {
    #[error("too few points ({points} < {min})")]
    TooFewPoints { points: usize, min: usize },

    #[error("path too short ({length:.3} < {min:.3})")]
    PathTooShort { length: f32, min: f32 },

    #[error("too brief ({duration_ms}ms < {min_ms}ms)")]
    TooBrief { duration_ms: u64, min_ms: u64 },

    #[error("interrupted after {idle_ms}ms without a hand")]
    Interrupted { idle_ms: u64 },

    #[error("no stroke in progress")]
    NotStarted,
}

/// A closed, normalized stroke ready for classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Normalized, resampled points (fixed length).
    pub points: Vec<Point2>,
    /// Points captured before resampling.
    pub raw_point_count: usize,
    /// Raw path length in landmark units.
    pub path_length: f32,
    pub duration_ms: u64,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Working memory for the single open stroke.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer {
    config: StrokeConfig,
    points: Vec<Point2>,
    started_ms: Option<u64>,
    last_ms: u64,
}

impl TrajectoryBuffer {
    pub fn new(config: StrokeConfig) -> Self {
        Self {
            config,
            points: Vec::with_capacity(128),
            started_ms: None,
            last_ms: 0,
        }
    }

    /// Opens a new stroke at `point`, dropping anything previously buffered.
    pub fn begin(&mut self, point: Point2, timestamp_ms: u64) {
        self.points.clear();
        self.points.push(point);
        self.started_ms = Some(timestamp_ms);
        self.last_ms = timestamp_ms;
    }

    /// Appends a point to the open stroke. Ignored when no stroke is open.
    pub fn add_point(&mut self, point: Point2, timestamp_ms: u64) -> bool {
        if self.started_ms.is_none() {
            return false;
        }
        self.points.push(point);
        self.last_ms = self.last_ms.max(timestamp_ms);
        true
    }

    /// Closes the stroke and returns the normalized trajectory.
    ///
    /// The buffer is empty and reusable afterwards, whether or not the
    /// stroke passed the discard policy.
    pub fn finish(&mut self) -> Result<Trajectory, Discard> {
        let Some(started_ms) = self.started_ms.take() else {
            return Err(Discard::NotStarted);
        };
        let result = self.evaluate(started_ms);
        self.points.clear();
        result
    }

    fn evaluate(&self, started_ms: u64) -> Result<Trajectory, Discard> {
        let raw_point_count = self.points.len();
        if raw_point_count < self.config.min_points {
            return Err(Discard::TooFewPoints {
                points: raw_point_count,
                min: self.config.min_points,
            });
        }

        let length = geometry::path_length(&self.points);
        if length < self.config.min_path_length {
            return Err(Discard::PathTooShort {
                length,
                min: self.config.min_path_length,
            });
        }

        let duration_ms = self.last_ms.saturating_sub(started_ms);
        if duration_ms < self.config.min_duration_ms {
            return Err(Discard::TooBrief {
                duration_ms,
                min_ms: self.config.min_duration_ms,
            });
        }

        let normalized = geometry::normalize(&self.points, self.config.reference_size);
        let points = geometry::resample(&normalized, self.config.resample_points);
        debug!(
            raw_points = raw_point_count,
            path_length = length,
            duration_ms,
            "Stroke closed"
        );

        Ok(Trajectory {
            points,
            raw_point_count,
            path_length: length,
            duration_ms,
        })
    }

    /// Drops the open stroke without evaluating it.
    pub fn clear(&mut self) {
        self.points.clear();
        self.started_ms = None;
    }

    pub fn is_open(&self) -> bool {
        self.started_ms.is_some()
    }

    /// Read-only view of the open stroke's raw points (for trail rendering).
    pub fn snapshot(&self) -> &[Point2] {
        &self.points
    }

    pub fn config(&self) -> &StrokeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StrokeConfig {
        StrokeConfig {
            min_points: 5,
            min_path_length: 0.1,
            min_duration_ms: 100,
            resample_points: 16,
            reference_size: 1.0,
        }
    }

    /// Feeds a horizontal line of `n` points, 0.05 apart, 30ms apart.
    fn feed_line(buffer: &mut TrajectoryBuffer, n: usize) {
        buffer.begin(Point2::new(0.0, 0.5), 0);
        for i in 1..n {
            buffer.add_point(Point2::new(i as f32 * 0.05, 0.5), i as u64 * 30);
        }
    }

    #[test]
    fn test_finish_returns_fixed_length_trajectory() {
        let mut buffer = TrajectoryBuffer::new(config());
        feed_line(&mut buffer, 10);

        let trajectory = buffer.finish().unwrap();
        assert_eq!(trajectory.len(), 16);
        assert_eq!(trajectory.raw_point_count, 10);
        assert_eq!(trajectory.duration_ms, 270);
        assert!((trajectory.path_length - 0.45).abs() < 1e-4);
    }

    #[test]
    fn test_trajectory_is_centered_and_scaled() {
        let mut buffer = TrajectoryBuffer::new(config());
        feed_line(&mut buffer, 10);

        let trajectory = buffer.finish().unwrap();
        let first = trajectory.points[0];
        let last = trajectory.points[trajectory.len() - 1];
        assert!((first.x + 0.5).abs() < 1e-4);
        assert!((last.x - 0.5).abs() < 1e-4);
        assert!(trajectory.points.iter().all(|p| p.y.abs() < 1e-4));
    }

    #[test]
    fn test_too_few_points_discarded() {
        let mut buffer = TrajectoryBuffer::new(config());
        feed_line(&mut buffer, 4);

        assert_eq!(
            buffer.finish(),
            Err(Discard::TooFewPoints { points: 4, min: 5 })
        );
    }

    #[test]
    fn test_short_path_discarded() {
        let mut buffer = TrajectoryBuffer::new(config());
        buffer.begin(Point2::new(0.5, 0.5), 0);
        for i in 1..8 {
            buffer.add_point(Point2::new(0.5 + i as f32 * 0.001, 0.5), i * 30);
        }

        assert!(matches!(
            buffer.finish(),
            Err(Discard::PathTooShort { .. })
        ));
    }

    #[test]
    fn test_brief_stroke_discarded() {
        let mut buffer = TrajectoryBuffer::new(config());
        buffer.begin(Point2::new(0.0, 0.0), 1000);
        for i in 1..8 {
            buffer.add_point(Point2::new(i as f32 * 0.1, 0.0), 1000 + i * 5);
        }

        assert_eq!(
            buffer.finish(),
            Err(Discard::TooBrief {
                duration_ms: 35,
                min_ms: 100
            })
        );
    }

    #[test]
    fn test_buffer_reusable_after_finish() {
        let mut buffer = TrajectoryBuffer::new(config());
        feed_line(&mut buffer, 3);
        assert!(buffer.finish().is_err());
        assert!(!buffer.is_open());
        assert!(buffer.snapshot().is_empty());

        feed_line(&mut buffer, 10);
        assert!(buffer.finish().is_ok());
    }

    #[test]
    fn test_finish_without_begin() {
        let mut buffer = TrajectoryBuffer::new(config());
        assert_eq!(buffer.finish(), Err(Discard::NotStarted));
    }

    #[test]
    fn test_add_point_ignored_when_closed() {
        let mut buffer = TrajectoryBuffer::new(config());
        assert!(!buffer.add_point(Point2::new(0.1, 0.1), 10));
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_clear_drops_open_stroke() {
        let mut buffer = TrajectoryBuffer::new(config());
        feed_line(&mut buffer, 6);
        assert_eq!(buffer.snapshot().len(), 6);

        buffer.clear();
        assert!(!buffer.is_open());
        assert_eq!(buffer.finish(), Err(Discard::NotStarted));
    }
}
