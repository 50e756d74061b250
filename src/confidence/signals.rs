//! Confidence signal schema.
//!
//! All signal fields are optional so intents can populate whatever subset
//! they actually measured; the engine resolves absent fields to neutral
//! defaults. Documented contract for callers: every supplied ratio/score
//! field lies in `[0, 1]`, and `missing_rows <= total_rows` when both are
//! given. The engine does not validate this; clamp upstream.

use serde::{Deserialize, Serialize};

/// Normalized signals used to score confidence across intents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSignals {
    // Data quality
    pub missing_rows: Option<u64>,
    pub total_rows: Option<u64>,
    pub coverage_ratio: Option<f64>,
    pub time_span_days: Option<f64>,

    // Gap clustering: longest run of missing rows, and number of runs
    pub missing_streak_max: Option<u64>,
    pub missing_streaks: Option<u64>,

    // Computation health
    pub computed_metrics_ok: Option<bool>,
    pub metric_stability: Option<f64>,

    // Corroboration
    pub corroboration: Option<f64>,
    pub contradictions: Option<i64>,

    // Domain risk modifiers; declared for the schema, not yet scored
    pub severity: Option<f64>,
    pub novelty: Option<f64>,
}

/// Discrete confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Medium,
    Low,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::High => "high",
            Band::Medium => "medium",
            Band::Low => "low",
        }
    }
}

/// Recommended next action when confidence is insufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Escalation {
    None,
    AskFollowup,
    HumanReview,
}

/// Per-category sub-scores, each independently computed and in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub coverage: f64,
    pub quality: f64,
    pub corroboration: f64,
    pub stability: f64,
    pub contradiction: f64,
}

/// Immutable scoring outcome. `reasons` ordering reflects the evaluation
/// order of signal categories, not severity, and is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub band: Band,
    pub reasons: Vec<String>,
    pub escalation: Escalation,
    pub score: f64,
    pub breakdown: ConfidenceBreakdown,
    pub signals: ConfidenceSignals,
}
