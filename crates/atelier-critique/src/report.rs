//! The critique report schema.
//!
//! The model is instructed to return exactly this JSON document; parsing
//! is lenient where the original behavior was lenient (a missing
//! `total_score` becomes 0) and strict where the pipeline depends on the
//! shape (scores are 1-5, advice entries must carry a region).

use serde::{Deserialize, Serialize};

use crate::client::CritiqueError;

/// Step 2: what kind of performance the image shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceType {
    pub representation: String,
    pub driver: String,
    pub atmosphere: String,
}

/// Region of the artwork an advice entry points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Step 4: one positional, actionable suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    pub coordinate: Coordinate,
    pub technique: String,
    pub direction: String,
}

/// One rubric score with its one-sentence reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u32,
    pub reason: String,
}

/// Step 5: the four-axis rubric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    pub media_mastery: ScoreEntry,
    pub structure_proportion: ScoreEntry,
    pub style_consistency: ScoreEntry,
    pub visual_completeness: ScoreEntry,
}

impl Scoring {
    fn entries(&self) -> [&ScoreEntry; 4] {
        [
            &self.media_mastery,
            &self.structure_proportion,
            &self.style_consistency,
            &self.visual_completeness,
        ]
    }
}

/// The full five-step critique document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueReport {
    pub step1_declaration: String,
    pub step2_performance: PerformanceType,
    pub step3_techniques: Vec<String>,
    pub step4_advice: Vec<Advice>,
    pub step5_scoring: Scoring,
    /// 0-100, scaled up from the rubric scores.
    #[serde(default)]
    pub total_score: u32,
}

impl CritiqueReport {
    /// Parse and validate the model's raw JSON payload.
    pub fn parse(raw: &str) -> Result<Self, CritiqueError> {
        let report: Self =
            serde_json::from_str(raw).map_err(|e| CritiqueError::Malformed(e.to_string()))?;
        report.validate()?;
        Ok(report)
    }

    /// Shape checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), CritiqueError> {
        for entry in self.step5_scoring.entries() {
            if !(1..=5).contains(&entry.score) {
                return Err(CritiqueError::Malformed(format!(
                    "rubric score {} outside 1-5",
                    entry.score
                )));
            }
        }
        if self.total_score > 100 {
            return Err(CritiqueError::Malformed(format!(
                "total score {} outside 0-100",
                self.total_score
            )));
        }
        if self.step4_advice.is_empty() {
            return Err(CritiqueError::Malformed(
                "report carries no positional advice".into(),
            ));
        }
        Ok(())
    }
}
