//! Brain response contracts.
//!
//! `BrainResponse` is the externally visible shape returned by every intent
//! and by the router: an answer sentence, the engine's confidence result,
//! the evidence behind it, and an optional structured payload. Serializable
//! to JSON with no binary fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::confidence::ConfidenceResult;
use crate::evidence::EvidenceBundle;

/// Named analytic capability with a fixed input contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SohTrendCompare,
    AnomalyScanTemp,
    LinkedDegradation,
}

impl Intent {
    pub const ALL: [Intent; 3] = [
        Intent::SohTrendCompare,
        Intent::AnomalyScanTemp,
        Intent::LinkedDegradation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SohTrendCompare => "soh_trend_compare",
            Intent::AnomalyScanTemp => "anomaly_scan_temp",
            Intent::LinkedDegradation => "linked_degradation",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "soh_trend_compare" => Some(Intent::SohTrendCompare),
            "anomaly_scan_temp" => Some(Intent::AnomalyScanTemp),
            "linked_degradation" => Some(Intent::LinkedDegradation),
            _ => None,
        }
    }
}

/// Reference to a sub-analysis folded into a linked bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedIntentRef {
    pub intent: String,
    pub evidence_id: String,
}

/// Evidence for the linked intent: references to each sub-bundle plus the
/// full sub-bundles themselves, preserved rather than discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEvidence {
    pub linked_intents: Vec<LinkedIntentRef>,
    pub degradation_evidence: EvidenceBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_evidence: Option<EvidenceBundle>,
}

/// Error-shaped evidence produced by the router when a request is invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterEvidence {
    pub intent: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<String>,
}

/// Evidence attached to a response. Leaf intents seal a single bundle;
/// linked reasoning wraps two; router validation failures carry a
/// structured error instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence {
    Bundle(Box<EvidenceBundle>),
    Linked(Box<LinkedEvidence>),
    Router(RouterEvidence),
}

impl Evidence {
    pub fn bundle(bundle: EvidenceBundle) -> Self {
        Evidence::Bundle(Box::new(bundle))
    }
}

/// The contract returned by every intent and by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainResponse {
    pub answer: String,
    pub confidence: ConfidenceResult,
    pub evidence: Evidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
