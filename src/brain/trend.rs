//! SoH trend comparison intent.
//!
//! Splits the window at a boundary timestamp, estimates a per-day SoH slope
//! on each half for every asset, and names the asset with the most negative
//! post-boundary slope as degrading fastest.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::adapters::{Signal, TelemetrySource, TimeWindow};
use crate::brain::contracts::{BrainResponse, Evidence, Intent};
use crate::brain::stats::{gap_stats, numeric_points, slope_per_day, GapStats};
use crate::confidence::{ConfidenceEngine, ConfidenceSignals};
use crate::evidence::EvidenceBuilder;

/// Per-asset trend metrics, also serialized into the response payload.
#[derive(Debug, Clone, Serialize)]
pub struct AssetTrend {
    pub pre_slope_per_day: Option<f64>,
    pub post_slope_per_day: Option<f64>,
    pub missing_rows: u64,
    pub row_count: u64,
}

/// Trend comparison outcome. The winner and per-asset metrics are exposed
/// alongside the response so linked reasoning can build on them without
/// re-parsing the payload.
#[derive(Debug)]
pub struct TrendComparison {
    pub response: BrainResponse,
    pub winner: Option<String>,
    pub per_asset: BTreeMap<String, AssetTrend>,
}

pub fn compare_soh_trend(
    source: &dyn TelemetrySource,
    asset_ids: &[String],
    window: &TimeWindow,
    boundary: DateTime<Utc>,
    role: &str,
) -> TrendComparison {
    let question = format!(
        "Which asset is degrading faster between {asset_ids:?} in the given window?"
    );
    let intent = Intent::SohTrendCompare;
    let engine = ConfidenceEngine::default();
    let mut ev = EvidenceBuilder::start(&question, intent.as_str(), Some(role));

    let mut per_asset: BTreeMap<String, AssetTrend> = BTreeMap::new();
    let mut gaps_notes: Vec<String> = Vec::new();
    let mut aggregate = GapStats::default();
    let mut total_rows = 0u64;

    for asset_id in asset_ids {
        let frame = match source.get_timeseries(
            asset_id,
            &[Signal::Soh, Signal::Temperature],
            Some(window),
            true,
        ) {
            Ok(frame) => frame,
            Err(err) => {
                // Soft degradation: the asset simply contributes no slope.
                warn!(asset_id, error = %err, "telemetry query failed");
                ev.add_gap(format!("Telemetry query failed for {asset_id}: {err}."));
                per_asset.insert(
                    asset_id.clone(),
                    AssetTrend {
                        pre_slope_per_day: None,
                        post_slope_per_day: None,
                        missing_rows: 0,
                        row_count: 0,
                    },
                );
                continue;
            }
        };

        let stats = gap_stats(&frame.rows);
        let quality_notes = if stats.missing_rows > 0 {
            format!("{} missing rows", stats.missing_rows)
        } else {
            "no missing rows".to_string()
        };
        ev.add_data_used(
            "telemetry",
            source.source_name(),
            json!({
                "asset_id": asset_id,
                "signals": ["soh", "temperature"],
                "granularity": "15m",
            }),
            frame.time_window.map(|w| json!({
                "start": w.start.to_rfc3339(),
                "end": w.end.to_rfc3339(),
            })),
            Some(frame.row_count() as u64),
            quality_notes,
        );

        let soh_points = numeric_points(&frame.rows, Signal::Soh);
        let pre: Vec<_> = soh_points.iter().copied().filter(|(t, _)| *t < boundary).collect();
        let post: Vec<_> = soh_points.iter().copied().filter(|(t, _)| *t >= boundary).collect();

        if stats.missing_rows > 0 {
            gaps_notes.push(format!(
                "{asset_id} has {} missing telemetry rows in-window.",
                stats.missing_rows
            ));
        }

        aggregate.missing_rows += stats.missing_rows;
        aggregate.missing_streaks += stats.missing_streaks;
        aggregate.missing_streak_max = aggregate.missing_streak_max.max(stats.missing_streak_max);
        total_rows += frame.row_count() as u64;

        per_asset.insert(
            asset_id.clone(),
            AssetTrend {
                pre_slope_per_day: slope_per_day(&pre),
                post_slope_per_day: slope_per_day(&post),
                missing_rows: stats.missing_rows,
                row_count: frame.row_count() as u64,
            },
        );
    }

    for note in &gaps_notes {
        ev.add_gap(note.clone());
    }

    // Winner = most negative post-boundary slope; stable tie-break by input
    // order (first asset with the minimum wins).
    let mut winner: Option<(&String, f64)> = None;
    for asset_id in asset_ids {
        if let Some(slope) = per_asset.get(asset_id).and_then(|a| a.post_slope_per_day) {
            match winner {
                Some((_, best)) if slope >= best => {}
                _ => winner = Some((asset_id, slope)),
            }
        }
    }

    let Some((winner_id, winner_slope)) = winner else {
        ev.add_gap("No valid post-boundary SoH slope could be computed for any asset.");
        let signals = ConfidenceSignals {
            missing_rows: Some(aggregate.missing_rows),
            total_rows: Some(total_rows),
            missing_streak_max: Some(aggregate.missing_streak_max),
            missing_streaks: Some(aggregate.missing_streaks),
            computed_metrics_ok: Some(false),
            ..Default::default()
        };
        let confidence = engine.score(&signals, Some(intent.as_str()));
        let response = BrainResponse {
            answer: "Insufficient data to compare degradation trends (post-boundary slope unavailable)."
                .to_string(),
            confidence,
            evidence: Evidence::bundle(ev.finalize()),
            data: Some(json!({
                "boundary": boundary.to_rfc3339(),
                "per_asset": &per_asset,
            })),
        };
        return TrendComparison {
            response,
            winner: None,
            per_asset,
        };
    };
    let winner_id = winner_id.clone();

    ev.add_computation(
        "soh_slope_compare",
        vec!["soh".to_string()],
        "Split window into pre/post boundary; estimate slope per day using \
         mean(last 10%) - mean(first 10%). Compare post-boundary slopes across assets.",
        json!({
            "boundary": boundary.to_rfc3339(),
            "per_asset": &per_asset,
            "winner": &winner_id,
        }),
        vec!["ASSUMP_SOH_IS_VALID_PROXY".to_string()],
    );
    ev.add_kb_rule(
        "knowledge_base/thresholds/README.md",
        "Threshold framework placeholder.",
        "No threshold enforcement; comparison is relative only.",
    );

    if per_asset.values().any(|a| a.post_slope_per_day.is_none()) {
        ev.add_risk_note(
            "One or more assets lacked sufficient post-boundary points; comparison limited.",
        );
    }

    let signals = ConfidenceSignals {
        missing_rows: Some(aggregate.missing_rows),
        total_rows: Some(total_rows),
        missing_streak_max: Some(aggregate.missing_streak_max),
        missing_streaks: Some(aggregate.missing_streaks),
        computed_metrics_ok: Some(true),
        ..Default::default()
    };
    let confidence = engine.score(&signals, Some(intent.as_str()));

    info!(
        winner = winner_id.as_str(),
        slope_per_day = winner_slope,
        band = confidence.band.as_str(),
        "trend comparison complete"
    );

    let answer = format!(
        "{winner_id} appears to be degrading faster (more negative post-boundary SoH slope) \
         within {} to {}.",
        window.start.to_rfc3339(),
        window.end.to_rfc3339()
    );

    let response = BrainResponse {
        answer,
        confidence,
        evidence: Evidence::bundle(ev.finalize()),
        data: Some(json!({
            "boundary": boundary.to_rfc3339(),
            "per_asset": &per_asset,
            "winner": &winner_id,
        })),
    };

    TrendComparison {
        response,
        winner: Some(winner_id),
        per_asset,
    }
}
