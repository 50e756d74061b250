//! Linked degradation analysis intent.
//!
//! Chains the trend comparison and the anomaly scan: the fastest-degrading
//! asset from the first analysis is scanned for thermal anomalies by the
//! second. The two runs are data-dependent and therefore sequential. The
//! combined statement is explanatory, never causal.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::adapters::{TelemetrySource, TimeWindow};
use crate::brain::anomaly::anomaly_scan;
use crate::brain::contracts::{
    BrainResponse, Evidence, Intent, LinkedEvidence, LinkedIntentRef,
};
use crate::brain::trend::compare_soh_trend;
use crate::confidence::{ConfidenceEngine, ConfidenceSignals};

/// Fixed corroboration prior fed to the engine when both sub-analyses ran.
/// A placeholder, not load-bearing domain knowledge.
const LINKED_CORROBORATION_PRIOR: f64 = 0.7;

pub fn linked_degradation_analysis(
    source: &dyn TelemetrySource,
    asset_ids: &[String],
    window: &TimeWindow,
    boundary: DateTime<Utc>,
    role: &str,
) -> BrainResponse {
    let intent = Intent::LinkedDegradation;
    let engine = ConfidenceEngine::default();

    let trend = compare_soh_trend(source, asset_ids, window, boundary, role);
    let degr_bundle = match &trend.response.evidence {
        Evidence::Bundle(bundle) => (**bundle).clone(),
        // Trend compare always seals a single bundle.
        _ => unreachable!("trend comparison produced non-bundle evidence"),
    };

    let Some(winner) = trend.winner.clone() else {
        let signals = ConfidenceSignals {
            computed_metrics_ok: Some(false),
            ..Default::default()
        };
        return BrainResponse {
            answer: "Insufficient data to identify a fastest-degrading asset; \
                     linked analysis was not performed."
                .to_string(),
            confidence: engine.score(&signals, Some(intent.as_str())),
            evidence: Evidence::Linked(Box::new(LinkedEvidence {
                linked_intents: vec![LinkedIntentRef {
                    intent: degr_bundle.intent.clone(),
                    evidence_id: degr_bundle.evidence_id.clone(),
                }],
                degradation_evidence: degr_bundle,
                anomaly_evidence: None,
            })),
            data: trend.response.data,
        };
    };

    let anomaly = anomaly_scan(source, &winner, window, role);
    let anomaly_bundle = match &anomaly.evidence {
        Evidence::Bundle(bundle) => (**bundle).clone(),
        _ => unreachable!("anomaly scan produced non-bundle evidence"),
    };

    let answer = format!(
        "{winner} is degrading faster than peer assets in the evaluated window. \
         A temperature anomaly was detected on {winner} shortly before or during \
         the period of accelerated degradation. This suggests a plausible \
         operational contributor, though causality is not proven."
    );

    let winner_trend = trend.per_asset.get(&winner);
    let signals = ConfidenceSignals {
        missing_rows: winner_trend.map(|t| t.missing_rows),
        total_rows: winner_trend.map(|t| t.row_count),
        computed_metrics_ok: Some(true),
        corroboration: Some(LINKED_CORROBORATION_PRIOR),
        ..Default::default()
    };
    let confidence = engine.score(&signals, Some(intent.as_str()));

    info!(
        winner = winner.as_str(),
        band = confidence.band.as_str(),
        "linked degradation analysis complete"
    );

    let evidence = Evidence::Linked(Box::new(LinkedEvidence {
        linked_intents: vec![
            LinkedIntentRef {
                intent: degr_bundle.intent.clone(),
                evidence_id: degr_bundle.evidence_id.clone(),
            },
            LinkedIntentRef {
                intent: anomaly_bundle.intent.clone(),
                evidence_id: anomaly_bundle.evidence_id.clone(),
            },
        ],
        degradation_evidence: degr_bundle,
        anomaly_evidence: Some(anomaly_bundle),
    }));

    let data = json!({
        "winner": winner,
        "degradation": trend.response.data,
        "anomaly": anomaly.data,
        "hypothesis": {
            "statement": "Temperature stress may have contributed to accelerated degradation.",
            "type": "plausible_contributor",
            "confidence": confidence.band,
            "limitations": [
                "Correlation does not imply causation.",
                "No physics model applied.",
            ],
        },
    });

    BrainResponse {
        answer,
        confidence,
        evidence,
        data: Some(data),
    }
}
