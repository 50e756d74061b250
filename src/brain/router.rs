//! Router - maps a question to one analytic intent and dispatches.
//!
//! Intent inference is keyword-based over the lowercased question; explicit
//! overrides skip inference. Argument-count preconditions are validated per
//! intent before dispatch, so an intent never runs with inputs it would
//! crash on. The router always returns a response, never an error.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::adapters::{TelemetrySource, TimeWindow};
use crate::brain::anomaly::anomaly_scan;
use crate::brain::contracts::{BrainResponse, Evidence, Intent, RouterEvidence};
use crate::brain::linked::linked_degradation_analysis;
use crate::brain::trend::compare_soh_trend;
use crate::confidence::{Band, ConfidenceBreakdown, ConfidenceResult, ConfidenceSignals, Escalation};

const THERMAL_KEYWORDS: [&str; 5] = ["temp", "thermal", "overheat", "spike", "anomal"];
const DEGRADATION_KEYWORDS: [&str; 6] = ["soh", "degrad", "health", "declin", "trend", "faster"];

/// Intent names accepted by `route`, `auto` included.
pub fn supported_intents() -> Vec<&'static str> {
    let mut names = vec!["auto"];
    names.extend(Intent::ALL.iter().map(|i| i.as_str()));
    names
}

/// Keyword inference, in priority order. Explanatory "why" questions about
/// degradation outrank the plain thermal and trend checks.
pub fn infer_intent(question: &str) -> Intent {
    let q = question.to_lowercase();

    if q.contains("why") && (q.contains("degrad") || q.contains("soh")) {
        return Intent::LinkedDegradation;
    }
    if THERMAL_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Intent::AnomalyScanTemp;
    }
    if DEGRADATION_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Intent::SohTrendCompare;
    }
    Intent::SohTrendCompare
}

/// Low-confidence result for a request the router refused to dispatch.
fn refusal_confidence(reason: impl Into<String>) -> ConfidenceResult {
    ConfidenceResult {
        band: Band::Low,
        reasons: vec![reason.into()],
        escalation: Escalation::AskFollowup,
        score: 0.0,
        breakdown: ConfidenceBreakdown {
            coverage: 0.0,
            quality: 0.0,
            corroboration: 0.0,
            stability: 0.0,
            contradiction: 0.0,
        },
        signals: ConfidenceSignals::default(),
    }
}

fn invalid_request(
    answer: String,
    reason: &str,
    error: &str,
    requested: Option<String>,
    data: serde_json::Value,
) -> BrainResponse {
    BrainResponse {
        answer,
        confidence: refusal_confidence(reason),
        evidence: Evidence::Router(RouterEvidence {
            intent: "router".to_string(),
            error: error.to_string(),
            requested,
        }),
        data: Some(data),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn route(
    source: &dyn TelemetrySource,
    question: &str,
    assets: &[String],
    window: &TimeWindow,
    boundary: DateTime<Utc>,
    intent: &str,
    role: &str,
) -> BrainResponse {
    let chosen = if intent == "auto" {
        infer_intent(question)
    } else {
        match Intent::parse(intent) {
            Some(parsed) => parsed,
            None => {
                return invalid_request(
                    format!(
                        "Unsupported intent: {intent}. Supported: {:?}",
                        supported_intents()
                    ),
                    "Invalid intent supplied.",
                    "unsupported_intent",
                    Some(intent.to_string()),
                    json!({ "supported_intents": supported_intents() }),
                );
            }
        }
    };

    info!(intent = chosen.as_str(), assets = assets.len(), "routing question");

    match chosen {
        Intent::SohTrendCompare => {
            if assets.len() < 2 {
                return invalid_request(
                    "soh_trend_compare requires at least 2 assets to compare.".to_string(),
                    "Need 2+ assets for comparison.",
                    "insufficient_assets",
                    None,
                    json!({ "required_assets": 2, "provided_assets": assets }),
                );
            }
            compare_soh_trend(source, assets, window, boundary, role).response
        }
        Intent::AnomalyScanTemp => {
            if assets.len() != 1 {
                return invalid_request(
                    "anomaly_scan_temp requires exactly 1 asset.".to_string(),
                    "Need exactly 1 asset for anomaly scan.",
                    "invalid_assets_for_anomaly",
                    None,
                    json!({ "required_assets": 1, "provided_assets": assets }),
                );
            }
            anomaly_scan(source, &assets[0], window, role)
        }
        Intent::LinkedDegradation => {
            if assets.len() < 2 {
                return invalid_request(
                    "linked_degradation requires at least 2 assets (winner chosen from comparison)."
                        .to_string(),
                    "Need 2+ assets for linked reasoning.",
                    "insufficient_assets_for_linked",
                    None,
                    json!({ "required_assets": 2, "provided_assets": assets }),
                );
            }
            linked_degradation_analysis(source, assets, window, boundary, role)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn why_degrading_routes_to_linked() {
        assert_eq!(infer_intent("why is it degrading"), Intent::LinkedDegradation);
        assert_eq!(infer_intent("WHY is the SoH dropping"), Intent::LinkedDegradation);
    }

    #[test]
    fn thermal_keywords_route_to_anomaly() {
        assert_eq!(infer_intent("any temperature spikes?"), Intent::AnomalyScanTemp);
        assert_eq!(infer_intent("is rack_01 overheating"), Intent::AnomalyScanTemp);
    }

    #[test]
    fn degradation_keywords_route_to_trend() {
        assert_eq!(
            infer_intent("which asset is degrading faster"),
            Intent::SohTrendCompare
        );
        assert_eq!(infer_intent("compare soh trend"), Intent::SohTrendCompare);
    }

    #[test]
    fn default_routes_to_trend() {
        assert_eq!(infer_intent("tell me something"), Intent::SohTrendCompare);
    }

    #[test]
    fn thermal_outranks_degradation_without_why() {
        // "anomal" hits the thermal set before the trend set is consulted.
        assert_eq!(
            infer_intent("soh anomalies this week"),
            Intent::AnomalyScanTemp
        );
    }
}
