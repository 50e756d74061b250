//! Evidence builder lifecycle: append-only recording, idempotent finalize,
//! and the serialized bundle shape.

use battery_brain::evidence::EvidenceBuilder;
use serde_json::json;

#[test]
fn finalize_twice_yields_equal_bundles() {
    let mut builder = EvidenceBuilder::start(
        "Which asset is degrading faster?",
        "soh_trend_compare",
        Some("asset_manager"),
    );
    builder.add_data_used(
        "telemetry",
        "v0",
        json!({"asset_id": "rack_01"}),
        None,
        Some(1344),
        "no missing rows",
    );
    builder.add_gap("rack_02 has 8 missing telemetry rows in-window.");

    let first = builder.finalize();
    let second = builder.finalize();

    assert_eq!(first, second);
    assert_eq!(first.evidence_id, second.evidence_id);
    assert_eq!(first.generated_at, second.generated_at);
}

#[test]
fn finalize_reflects_later_appends() {
    let mut builder = EvidenceBuilder::start("q", "anomaly_scan_temp", None);
    let before = builder.finalize();
    builder.add_risk_note("threshold tuned to fixture noise");
    let after = builder.finalize();

    assert_ne!(before, after);
    assert_eq!(before.evidence_id, after.evidence_id);
    assert!(before.assumptions_and_gaps.risk_notes.is_empty());
    assert_eq!(after.assumptions_and_gaps.risk_notes, "threshold tuned to fixture noise");
}

#[test]
fn evidence_id_is_prefixed_and_unique() {
    let a = EvidenceBuilder::start("q", "x", None).finalize();
    let b = EvidenceBuilder::start("q", "x", None).finalize();
    assert!(a.evidence_id.starts_with("ev_"));
    assert_ne!(a.evidence_id, b.evidence_id);
}

#[test]
fn computations_keep_call_order_and_payload() {
    let mut builder = EvidenceBuilder::start("q", "soh_trend_compare", None);
    builder.add_computation(
        "soh_slope_compare",
        vec!["soh".to_string()],
        "pre/post slope comparison",
        json!({"winner": "rack_02"}),
        vec!["ASSUMP_SOH_IS_VALID_PROXY".to_string()],
    );
    builder.add_computation(
        "temp_spike_scan",
        vec!["temperature".to_string()],
        "percentile threshold",
        json!({"spike_count": 4}),
        vec![],
    );

    let bundle = builder.finalize();
    assert_eq!(bundle.computations.len(), 2);
    assert_eq!(bundle.computations[0].name, "soh_slope_compare");
    assert_eq!(bundle.computations[1].outputs["spike_count"], 4);
}

#[test]
fn model_calls_record_version_and_limitations() {
    let mut builder = EvidenceBuilder::start("q", "anomaly_scan_temp", None);
    builder.add_model_call(
        "threshold_model",
        Some("v0".to_string()),
        json!({"points": 1336}),
        json!({"threshold": 32.8}),
        None,
        "percentile heuristic, not a physics model",
    );

    let bundle = builder.finalize();
    assert_eq!(bundle.model_calls.len(), 1);
    assert_eq!(bundle.model_calls[0].model_version.as_deref(), Some("v0"));
    assert!(bundle.model_calls[0].limitations.contains("heuristic"));
}

#[test]
fn serialized_bundle_has_expected_shape() {
    let mut builder = EvidenceBuilder::start("q", "anomaly_scan_temp", Some("ops"));
    builder.add_kb_rule("kb/thresholds", "placeholder", "relative comparison only");
    builder.add_assumption("ASSUMP_X", "synthetic noise is realistic");
    builder.add_attachment("charts", "chart://temp");

    let value = serde_json::to_value(builder.finalize()).unwrap();
    assert!(value["evidence_id"].is_string());
    assert!(value["generated_at"].is_string());
    assert_eq!(value["intent"], "anomaly_scan_temp");
    assert_eq!(value["role"], "ops");
    assert_eq!(value["kb_rules_applied"][0]["kb_ref"], "kb/thresholds");
    assert_eq!(value["assumptions_and_gaps"]["assumptions"][0]["ref"], "ASSUMP_X");
    assert_eq!(value["attachments"]["charts"][0], "chart://temp");
    assert!(value["attachments"]["tables"].as_array().unwrap().is_empty());
}
