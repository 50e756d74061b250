//! Properties of the confidence engine: boundedness, monotonicity under gap
//! clustering, band/threshold consistency, and never-empty reasons.

use battery_brain::confidence::{Band, ConfidenceEngine, ConfidenceSignals, Escalation};

fn engine() -> ConfidenceEngine {
    ConfidenceEngine::default()
}

#[test]
fn clustered_missing_penalizes_more_than_scattered() {
    let base = ConfidenceSignals {
        missing_rows: Some(8),
        total_rows: Some(1344),
        computed_metrics_ok: Some(true),
        corroboration: Some(0.8),
        ..Default::default()
    };
    let scattered = ConfidenceSignals {
        missing_streak_max: Some(1),
        missing_streaks: Some(8),
        ..base.clone()
    };
    let clustered = ConfidenceSignals {
        missing_streak_max: Some(8),
        missing_streaks: Some(1),
        ..base
    };

    let s = engine().score(&scattered, None);
    let c = engine().score(&clustered, None);
    assert!(c.score < s.score, "clustered {} !< scattered {}", c.score, s.score);
}

#[test]
fn growing_streak_max_never_raises_the_score() {
    let mut last = f64::INFINITY;
    for streak_max in [0u64, 1, 4, 8, 16, 32] {
        let signals = ConfidenceSignals {
            missing_rows: Some(32),
            total_rows: Some(1344),
            missing_streak_max: Some(streak_max),
            missing_streaks: Some(1),
            computed_metrics_ok: Some(true),
            ..Default::default()
        };
        let score = engine().score(&signals, None).score;
        assert!(score <= last, "streak_max={streak_max}: {score} > {last}");
        last = score;
    }
}

#[test]
fn score_and_breakdown_are_bounded() {
    let extremes = [
        ConfidenceSignals::default(),
        ConfidenceSignals {
            missing_rows: Some(1344),
            total_rows: Some(1344),
            missing_streak_max: Some(1344),
            missing_streaks: Some(1),
            computed_metrics_ok: Some(false),
            contradictions: Some(100),
            ..Default::default()
        },
        ConfidenceSignals {
            coverage_ratio: Some(1.0),
            metric_stability: Some(1.0),
            corroboration: Some(1.0),
            missing_rows: Some(0),
            total_rows: Some(10),
            ..Default::default()
        },
        ConfidenceSignals {
            missing_rows: Some(0),
            total_rows: Some(0),
            ..Default::default()
        },
    ];

    for signals in extremes {
        let res = engine().score(&signals, None);
        assert!((0.0..=1.0).contains(&res.score));
        for component in [
            res.breakdown.coverage,
            res.breakdown.quality,
            res.breakdown.corroboration,
            res.breakdown.stability,
            res.breakdown.contradiction,
        ] {
            assert!((0.0..=1.0).contains(&component), "component {component} out of range");
        }
    }
}

#[test]
fn bands_match_thresholds() {
    // Strong signals across the board
    let high = engine().score(
        &ConfidenceSignals {
            coverage_ratio: Some(1.0),
            missing_rows: Some(0),
            total_rows: Some(100),
            metric_stability: Some(1.0),
            corroboration: Some(1.0),
            ..Default::default()
        },
        None,
    );
    assert!(high.score >= 0.75);
    assert_eq!(high.band, Band::High);
    assert_eq!(high.escalation, Escalation::None);

    // Heavy missingness and contradictions drive the score under 0.50
    let low = engine().score(
        &ConfidenceSignals {
            missing_rows: Some(1000),
            total_rows: Some(1000),
            metric_stability: Some(0.0),
            corroboration: Some(0.0),
            contradictions: Some(4),
            ..Default::default()
        },
        None,
    );
    assert!(low.score < 0.50);
    assert_eq!(low.band, Band::Low);
    assert_eq!(low.escalation, Escalation::AskFollowup);
}

#[test]
fn failed_computations_override_banding() {
    let res = engine().score(
        &ConfidenceSignals {
            coverage_ratio: Some(1.0),
            missing_rows: Some(0),
            total_rows: Some(100),
            metric_stability: Some(1.0),
            corroboration: Some(1.0),
            computed_metrics_ok: Some(false),
            ..Default::default()
        },
        None,
    );
    assert!(res.score >= 0.75, "override must not depend on a low score");
    assert_eq!(res.band, Band::Low);
    assert_eq!(res.escalation, Escalation::AskFollowup);
}

#[test]
fn reasons_are_never_empty() {
    let cases = [
        ConfidenceSignals::default(),
        ConfidenceSignals {
            missing_rows: Some(0),
            total_rows: Some(100),
            computed_metrics_ok: Some(true),
            metric_stability: Some(0.9),
            ..Default::default()
        },
        ConfidenceSignals {
            missing_rows: Some(50),
            total_rows: Some(100),
            contradictions: Some(1),
            ..Default::default()
        },
    ];
    for signals in cases {
        let res = engine().score(&signals, None);
        assert!(!res.reasons.is_empty());
    }
}

#[test]
fn absent_corroboration_adds_no_reason() {
    let res = engine().score(
        &ConfidenceSignals {
            missing_rows: Some(0),
            total_rows: Some(100),
            computed_metrics_ok: Some(true),
            metric_stability: Some(0.9),
            ..Default::default()
        },
        None,
    );
    assert!(!res.reasons.iter().any(|r| r.contains("corroborat")));
}

#[test]
fn result_echoes_the_signals() {
    let signals = ConfidenceSignals {
        missing_rows: Some(8),
        total_rows: Some(1344),
        ..Default::default()
    };
    let res = engine().score(&signals, Some("anomaly_scan_temp"));
    assert_eq!(res.signals, signals);
}
