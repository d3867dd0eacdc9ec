//! Smile classification from per-frame expression scores.
//!
//! The face model itself is external. It hands over one confidence score
//! per expression category, and a [`SmileClassifier`] turns those into a
//! yes/no answer for the current frame.

use serde::{Deserialize, Serialize};

use crate::storage::DetectionConfig;

/// Category index of the left mouth corner raise in the face model output.
pub const MOUTH_SMILE_LEFT: usize = 44;
/// Category index of the right mouth corner raise.
pub const MOUTH_SMILE_RIGHT: usize = 45;

/// One expression category score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub index: usize,
    #[serde(default)]
    pub name: String,
    pub score: f64,
}

/// All category scores for one detected face.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionScores {
    pub categories: Vec<Category>,
}

impl ExpressionScores {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Build from `(index, score)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        Self {
            categories: pairs
                .into_iter()
                .map(|(index, score)| Category {
                    index,
                    name: String::new(),
                    score,
                })
                .collect(),
        }
    }

    pub fn score_at(&self, index: usize) -> Option<f64> {
        self.categories
            .iter()
            .find(|c| c.index == index)
            .map(|c| c.score)
    }
}

/// What the face model produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameResult {
    NoFace,
    Face(ExpressionScores),
}

/// Per-frame verdict consumed by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    NoFace,
    Smiling,
    NotSmiling,
}

pub trait SmileClassifier {
    /// False while the underlying model is still loading.
    fn is_ready(&self) -> bool {
        true
    }

    fn is_smiling(&self, scores: &ExpressionScores) -> bool;

    fn classify(&self, frame: &FrameResult) -> Classification {
        match frame {
            FrameResult::NoFace => Classification::NoFace,
            FrameResult::Face(scores) if scores.categories.is_empty() => Classification::NoFace,
            FrameResult::Face(scores) => {
                if self.is_smiling(scores) {
                    Classification::Smiling
                } else {
                    Classification::NotSmiling
                }
            }
        }
    }
}

/// Smiling iff any watched category scores strictly above the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdClassifier {
    threshold: f64,
    categories: Vec<usize>,
    ready: bool,
}

impl ThresholdClassifier {
    pub fn new(threshold: f64, categories: Vec<usize>) -> Self {
        Self {
            threshold,
            categories,
            ready: true,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.threshold, config.smile_categories.clone())
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new(0.7, vec![MOUTH_SMILE_LEFT, MOUTH_SMILE_RIGHT])
    }
}

impl SmileClassifier for ThresholdClassifier {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_smiling(&self, scores: &ExpressionScores) -> bool {
        self.categories
            .iter()
            .any(|&index| scores.score_at(index).unwrap_or(0.0) > self.threshold)
    }
}
