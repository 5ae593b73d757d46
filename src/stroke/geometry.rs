//! 2D geometry for stroke normalization.
//!
//! Strokes are translated to their bounding-box center, scaled so the longer
//! side matches a reference size, and resampled to a fixed number of points
//! spaced equally along the path.

use serde::{Deserialize, Serialize};

/// A point on the image plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `other` by `t` in [0, 1].
    pub fn lerp(&self, other: &Point2, t: f32) -> Point2 {
        Point2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl From<crate::landmark::Landmark> for Point2 {
    fn from(landmark: crate::landmark::Landmark) -> Self {
        Self::new(landmark.x, landmark.y)
    }
}

impl From<[f32; 2]> for Point2 {
    fn from([x, y]: [f32; 2]) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    /// Returns `None` for an empty point set.
    pub fn of(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |bb, p| Self {
            min_x: bb.min_x.min(p.x),
            min_y: bb.min_y.min(p.y),
            max_x: bb.max_x.max(p.x),
            max_y: bb.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Total length of the polyline through `points`.
pub fn path_length(points: &[Point2]) -> f32 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Center on the bounding box and scale the longer side to `reference_size`.
///
/// Aspect ratio is preserved. A degenerate (single-point) stroke is only
/// translated.
pub fn normalize(points: &[Point2], reference_size: f32) -> Vec<Point2> {
    let Some(bbox) = BoundingBox::of(points) else {
        return Vec::new();
    };
    let center = bbox.center();
    let longest = bbox.width().max(bbox.height());
    let scale = if longest > f32::EPSILON {
        reference_size / longest
    } else {
        1.0
    };

    points
        .iter()
        .map(|p| Point2::new((p.x - center.x) * scale, (p.y - center.y) * scale))
        .collect()
}

/// Resample to `count` points equally spaced along the path.
///
/// The first and last input points are kept as the first and last outputs.
pub fn resample(points: &[Point2], count: usize) -> Vec<Point2> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    if count < 2 {
        return vec![first; count];
    }

    let total = path_length(points);
    if total <= f32::EPSILON {
        return vec![first; count];
    }

    let interval = total / (count - 1) as f32;
    let mut out = Vec::with_capacity(count);
    out.push(first);

    let mut carried = 0.0_f32;
    for window in points.windows(2) {
        let end = window[1];
        let mut start = window[0];
        let mut remaining = start.distance_to(&end);

        while remaining > 0.0 && carried + remaining >= interval && out.len() < count - 1 {
            let step = interval - carried;
            let q = start.lerp(&end, step / remaining);
            out.push(q);
            start = q;
            remaining -= step;
            carried = 0.0;
        }
        carried += remaining;
    }

    // Float accumulation can leave the tail one short; the last point closes it.
    let last = points[points.len() - 1];
    while out.len() < count {
        out.push(last);
    }
    out
}
