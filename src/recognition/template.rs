//! Nearest-template letter classifier.
//!
//! Each template is a single-stroke drawing of a letter. Templates and
//! incoming trajectories are normalized to the same box and resampled to the
//! same number of points, then compared by mean point-to-point distance. The
//! closest template wins; its distance maps to a confidence where 0 is half
//! the box diagonal or worse and 1 is a perfect match.

use crate::defaults;
use crate::error::{AirwriteError, Result};
use crate::recognition::classifier::{ALPHABET, LetterCandidate, LetterClassifier};
use crate::stroke::geometry::{self, Point2};
use crate::stroke::Trajectory;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const BUILTIN_NAME: &str = "builtin-templates";

/// On-disk template set.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    name: Option<String>,
    templates: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    letter: char,
    points: Vec<[f32; 2]>,
}

#[derive(Debug, Clone)]
struct Template {
    letter: char,
    points: Vec<Point2>,
}

#[derive(Debug, Clone)]
pub struct TemplateClassifier {
    name: String,
    templates: Vec<Template>,
    resolution: usize,
    reference_size: f32,
}

impl TemplateClassifier {
    /// Build from `(letter, points)` pairs. Points are in image orientation
    /// (y grows downward).
    pub fn from_templates(name: &str, templates: Vec<(char, Vec<Point2>)>) -> Result<Self> {
        if templates.is_empty() {
            return Err(AirwriteError::ClassifierUnavailable {
                message: format!("template set '{}' is empty", name),
            });
        }

        let resolution = defaults::RESAMPLE_POINTS;
        let reference_size = defaults::REFERENCE_SIZE;
        let mut prepared = Vec::with_capacity(templates.len());
        for (letter, points) in templates {
            let letter = letter.to_ascii_uppercase();
            if !ALPHABET.contains(&letter) {
                return Err(AirwriteError::TemplateParse {
                    message: format!("'{}' is not a letter A-Z", letter),
                });
            }
            if points.len() < 2 {
                return Err(AirwriteError::TemplateParse {
                    message: format!("template '{}' needs at least 2 points", letter),
                });
            }
            let normalized = geometry::normalize(&points, reference_size);
            prepared.push(Template {
                letter,
                points: geometry::resample(&normalized, resolution),
            });
        }

        Ok(Self {
            name: name.to_string(),
            templates: prepared,
            resolution,
            reference_size,
        })
    }

    /// Parse a JSON template set:
    /// `{"name": "...", "templates": [{"letter": "L", "points": [[x, y], ...]}]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TemplateFile =
            serde_json::from_str(json).map_err(|e| AirwriteError::TemplateParse {
                message: e.to_string(),
            })?;
        let name = file.name.unwrap_or_else(|| "templates".to_string());
        let templates = file
            .templates
            .into_iter()
            .map(|t| (t.letter, t.points.into_iter().map(Point2::from).collect()))
            .collect();
        Self::from_templates(&name, templates)
    }

    /// Load a JSON template set from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AirwriteError::ClassifierUnavailable {
                message: format!("cannot read {}: {}", path.display(), e),
            }
        })?;
        let classifier = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            templates = classifier.len(),
            "Loaded letter templates"
        );
        Ok(classifier)
    }

    /// A small single-stroke set covering letters that can be drawn without
    /// lifting the finger.
    pub fn builtin() -> Result<Self> {
        let set: &[(char, &[[f32; 2]])] = &[
            ('I', &[[0.5, 0.0], [0.5, 1.0]]),
            ('L', &[[0.0, 0.0], [0.0, 1.0], [0.6, 1.0]]),
            ('J', &[[0.8, 0.0], [0.8, 0.8], [0.5, 1.0], [0.2, 0.8]]),
            ('V', &[[0.0, 0.0], [0.5, 1.0], [1.0, 0.0]]),
            ('Z', &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]),
            ('N', &[[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]]),
            (
                'M',
                &[[0.0, 1.0], [0.0, 0.0], [0.5, 0.6], [1.0, 0.0], [1.0, 1.0]],
            ),
            (
                'W',
                &[[0.0, 0.0], [0.25, 1.0], [0.5, 0.4], [0.75, 1.0], [1.0, 0.0]],
            ),
            (
                'U',
                &[
                    [0.0, 0.0],
                    [0.0, 0.8],
                    [0.2, 1.0],
                    [0.8, 1.0],
                    [1.0, 0.8],
                    [1.0, 0.0],
                ],
            ),
            (
                'O',
                &[
                    [0.5, 0.0],
                    [0.15, 0.15],
                    [0.0, 0.5],
                    [0.15, 0.85],
                    [0.5, 1.0],
                    [0.85, 0.85],
                    [1.0, 0.5],
                    [0.85, 0.15],
                    [0.5, 0.0],
                ],
            ),
            (
                'C',
                &[
                    [0.9, 0.15],
                    [0.5, 0.0],
                    [0.15, 0.15],
                    [0.0, 0.5],
                    [0.15, 0.85],
                    [0.5, 1.0],
                    [0.9, 0.85],
                ],
            ),
        ];

        let templates = set
            .iter()
            .map(|(letter, points)| (*letter, points.iter().copied().map(Point2::from).collect()))
            .collect();

        Self::from_templates(BUILTIN_NAME, templates)
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Letters covered, in template order, without duplicates.
    pub fn letters(&self) -> Vec<char> {
        let mut letters: Vec<char> = Vec::new();
        for t in &self.templates {
            if !letters.contains(&t.letter) {
                letters.push(t.letter);
            }
        }
        letters
    }

    fn half_diagonal(&self) -> f32 {
        self.reference_size * std::f32::consts::SQRT_2 / 2.0
    }
}

fn mean_distance(a: &[Point2], b: &[Point2]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f32::INFINITY;
    }
    let sum: f32 = a.iter().zip(b).map(|(p, q)| p.distance_to(q)).sum();
    sum / n as f32
}

impl LetterClassifier for TemplateClassifier {
    fn classify(&self, trajectory: &Trajectory) -> Result<LetterCandidate> {
        if self.templates.is_empty() {
            return Err(AirwriteError::ClassifierUnavailable {
                message: format!("template set '{}' is empty", self.name),
            });
        }
        if trajectory.points.len() < 2 {
            return Err(AirwriteError::Classification {
                message: format!("trajectory has {} points", trajectory.points.len()),
            });
        }

        let normalized = geometry::normalize(&trajectory.points, self.reference_size);
        let forward = geometry::resample(&normalized, self.resolution);
        let reversed: Vec<Point2> = forward.iter().rev().copied().collect();

        let mut best: Option<(char, f32)> = None;
        for template in &self.templates {
            let d = mean_distance(&forward, &template.points)
                .min(mean_distance(&reversed, &template.points));
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((template.letter, d));
            }
        }

        let Some((letter, distance)) = best else {
            return Err(AirwriteError::Classification {
                message: "no template matched".to_string(),
            });
        };
        let confidence = (1.0 - distance / self.half_diagonal()).clamp(0.0, 1.0);
        debug!(%letter, distance, confidence, "Template match");

        Ok(LetterCandidate::new(letter, confidence))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
