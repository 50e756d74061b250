//! Temperature anomaly scan intent.
//!
//! Percentile-based spike detection over one asset's temperature signal,
//! cross-referenced against the event log for corroboration.

use serde_json::json;
use tracing::{info, warn};

use crate::adapters::{Signal, TelemetrySource, TimeWindow};
use crate::brain::contracts::{BrainResponse, Evidence, Intent};
use crate::brain::stats::{gap_stats, numeric_points, percentile};
use crate::confidence::{ConfidenceEngine, ConfidenceSignals};
use crate::evidence::EvidenceBuilder;

/// Event type treated as thermal-spike corroboration.
const THERMAL_EVENT_TYPE: &str = "temp_spike";

/// Spikes reported verbatim in the payload are capped for readability.
const REPORTED_SPIKE_CAP: usize = 20;

#[derive(Debug, Clone)]
pub struct AnomalyScanConfig {
    /// Absolute margin added to the p95 to form the spike threshold.
    /// Tunable: the default is coupled to the synthetic fixture's noise
    /// scale, not a physical limit.
    pub spike_margin: f64,
    /// Minimum count of valid temperature points required to scan.
    pub min_valid_points: usize,
}

impl Default for AnomalyScanConfig {
    fn default() -> Self {
        Self {
            spike_margin: 1.0,
            min_valid_points: 40,
        }
    }
}

pub fn anomaly_scan(
    source: &dyn TelemetrySource,
    asset_id: &str,
    window: &TimeWindow,
    role: &str,
) -> BrainResponse {
    anomaly_scan_with(source, asset_id, window, role, &AnomalyScanConfig::default())
}

pub fn anomaly_scan_with(
    source: &dyn TelemetrySource,
    asset_id: &str,
    window: &TimeWindow,
    role: &str,
    config: &AnomalyScanConfig,
) -> BrainResponse {
    let question = format!("Scan {asset_id} for temperature anomalies in the given window.");
    let intent = Intent::AnomalyScanTemp;
    let engine = ConfidenceEngine::default();
    let mut ev = EvidenceBuilder::start(&question, intent.as_str(), Some(role));

    let frame = match source.get_timeseries(asset_id, &[Signal::Temperature], Some(window), true) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(asset_id, error = %err, "telemetry query failed");
            ev.add_gap(format!("Telemetry query failed for {asset_id}: {err}."));
            let signals = ConfidenceSignals {
                computed_metrics_ok: Some(false),
                ..Default::default()
            };
            return BrainResponse {
                answer: format!("Unable to scan {asset_id} for temperature anomalies."),
                confidence: engine.score(&signals, Some(intent.as_str())),
                evidence: Evidence::bundle(ev.finalize()),
                data: Some(json!({ "asset_id": asset_id, "spike_count": 0 })),
            };
        }
    };

    let stats = gap_stats(&frame.rows);
    let missing = stats.missing_rows;
    let quality_notes = if missing > 0 {
        format!("{missing} missing rows")
    } else {
        "no missing rows".to_string()
    };
    ev.add_data_used(
        "telemetry",
        source.source_name(),
        json!({
            "asset_id": asset_id,
            "signals": ["temperature"],
            "granularity": "15m",
        }),
        Some(json!({
            "start": window.start.to_rfc3339(),
            "end": window.end.to_rfc3339(),
        })),
        Some(frame.row_count() as u64),
        quality_notes,
    );

    let temps = numeric_points(&frame.rows, Signal::Temperature);
    let values: Vec<f64> = temps.iter().map(|(_, v)| *v).collect();

    if values.len() < config.min_valid_points {
        ev.add_gap("Insufficient temperature points for anomaly scan.");
        let signals = ConfidenceSignals {
            missing_rows: Some(missing),
            total_rows: Some(frame.row_count() as u64),
            computed_metrics_ok: Some(false),
            ..Default::default()
        };
        return BrainResponse {
            answer: format!("Insufficient data to scan {asset_id} for temperature anomalies."),
            confidence: engine.score(&signals, Some(intent.as_str())),
            evidence: Evidence::bundle(ev.finalize()),
            data: Some(json!({
                "asset_id": asset_id,
                "points": values.len(),
                "missing_rows": missing,
                "spike_count": 0,
            })),
        };
    }

    // The early return above guarantees these; percentile of a non-empty
    // slice always exists.
    let p50 = percentile(&values, 0.50).unwrap_or_default();
    let p95 = percentile(&values, 0.95).unwrap_or_default();
    let threshold = p95 + config.spike_margin;

    let spikes: Vec<_> = temps.iter().filter(|(_, v)| *v >= threshold).collect();

    let events = match source.get_events(asset_id, Some(window)) {
        Ok(events) => events,
        Err(err) => {
            warn!(asset_id, error = %err, "event query failed");
            ev.add_gap(format!("Event query failed for {asset_id}: {err}."));
            Vec::new()
        }
    };
    if !events.is_empty() {
        ev.add_data_used(
            "events",
            source.source_name(),
            json!({ "asset_id": asset_id }),
            Some(json!({
                "start": window.start.to_rfc3339(),
                "end": window.end.to_rfc3339(),
            })),
            Some(events.len() as u64),
            "event log cross-reference",
        );
    }

    ev.add_computation(
        "temp_spike_scan",
        vec!["temperature".to_string()],
        format!(
            "Compute p50 and p95 of temperature; flag spike if temperature >= (p95 + {:.1}).",
            config.spike_margin
        ),
        json!({
            "p50": p50,
            "p95": p95,
            "threshold": threshold,
            "spike_count": spikes.len(),
            "first_spike_ts": spikes.first().map(|(t, _)| t.to_rfc3339()),
            "last_spike_ts": spikes.last().map(|(t, _)| t.to_rfc3339()),
        }),
        vec!["ASSUMP_FIXTURE_NOISE_SCALE".to_string()],
    );

    if missing > 0 {
        ev.add_gap(format!(
            "{asset_id} has {missing} missing telemetry rows in-window."
        ));
    }

    let event_hit = events.iter().any(|e| e.event_type == THERMAL_EVENT_TYPE);
    let corroboration = if event_hit && !spikes.is_empty() {
        Some(0.8)
    } else {
        None
    };

    let signals = ConfidenceSignals {
        missing_rows: Some(missing),
        total_rows: Some(frame.row_count() as u64),
        computed_metrics_ok: Some(true),
        corroboration,
        ..Default::default()
    };
    let confidence = engine.score(&signals, Some(intent.as_str()));

    let answer = if let (Some((first, _)), Some((last, _))) = (spikes.first(), spikes.last()) {
        format!(
            "Temperature anomaly detected for {asset_id}: spike activity observed from {} to {} \
             (threshold = {threshold:.2}).",
            first.to_rfc3339(),
            last.to_rfc3339()
        )
    } else {
        format!(
            "No temperature spike anomalies detected for {asset_id} in the window \
             (threshold = {threshold:.2})."
        )
    };

    info!(
        asset_id,
        spike_count = spikes.len(),
        threshold,
        corroborated = event_hit,
        "anomaly scan complete"
    );

    let data = json!({
        "asset_id": asset_id,
        "comparison_window": {
            "start": window.start.to_rfc3339(),
            "end": window.end.to_rfc3339(),
        },
        "stats": { "p50": p50, "p95": p95, "threshold": threshold },
        "spikes": spikes
            .iter()
            .take(REPORTED_SPIKE_CAP)
            .map(|(t, v)| json!({ "timestamp": t.to_rfc3339(), "temperature": v }))
            .collect::<Vec<_>>(),
        "spike_count": spikes.len(),
        "events": events,
        "missing_rows": missing,
    });

    BrainResponse {
        answer,
        confidence,
        evidence: Evidence::bundle(ev.finalize()),
        data: Some(data),
    }
}
