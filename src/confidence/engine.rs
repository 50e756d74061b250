//! Confidence engine.
//!
//! The single confidence authority: maps a `ConfidenceSignals` set to a
//! weighted score over five independent components, a band, and an
//! escalation action. Pure and deterministic over the engine configuration
//! and the passed-in signals; absent optional signals are a handled case,
//! never an error.

use tracing::debug;

use super::signals::{Band, ConfidenceBreakdown, ConfidenceResult, ConfidenceSignals, Escalation};

fn clamp(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

/// Weights and thresholds are configuration, not per-call state, so one
/// engine value can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct ConfidenceEngine {
    pub w_coverage: f64,
    pub w_quality: f64,
    pub w_corroboration: f64,
    pub w_stability: f64,
    pub w_contradiction: f64,

    pub high_threshold: f64,
    pub medium_threshold: f64,
}

impl Default for ConfidenceEngine {
    fn default() -> Self {
        Self {
            w_coverage: 0.25,
            w_quality: 0.25,
            w_corroboration: 0.20,
            w_stability: 0.20,
            w_contradiction: 0.10,
            high_threshold: 0.75,
            medium_threshold: 0.50,
        }
    }
}

impl ConfidenceEngine {
    /// Score one signal set. `context` is an optional intent label used for
    /// bookkeeping (a debug log line) only; it never influences the score.
    pub fn score(&self, signals: &ConfidenceSignals, context: Option<&str>) -> ConfidenceResult {
        let mut reasons: Vec<String> = Vec::new();

        // Coverage
        let coverage = if let Some(ratio) = signals.coverage_ratio {
            clamp(ratio)
        } else if let (Some(total), Some(missing)) = (signals.total_rows, signals.missing_rows) {
            clamp(1.0 - safe_div(missing as f64, total as f64))
        } else {
            reasons.push("Coverage ratio not provided; using neutral default.".to_string());
            0.6
        };

        // Quality: missingness penalized super-linearly, then a clustering
        // penalty for continuous gaps, which are riskier than scattered ones.
        let quality = if let (Some(total), Some(missing)) = (signals.total_rows, signals.missing_rows)
        {
            let miss_ratio = safe_div(missing as f64, total as f64);
            let mut quality = clamp(1.0 - miss_ratio * 1.2);
            if miss_ratio > 0.0 {
                reasons.push(
                    "Telemetry contains missing intervals; confidence reduced.".to_string(),
                );
            }

            let streak_max = signals.missing_streak_max.unwrap_or(0);
            let streaks = signals.missing_streaks.unwrap_or(0);

            if streak_max > 0 {
                let mut cluster_penalty = 0.0;

                // At 15m cadence: 4 = 1h gap; 8 = 2h; 16 = 4h.
                if streak_max >= 4 {
                    cluster_penalty += 0.05;
                }
                if streak_max >= 8 {
                    cluster_penalty += 0.07;
                }
                if streak_max >= 16 {
                    cluster_penalty += 0.10;
                }

                // Mostly scattered gaps (many streaks, small max) hurt less.
                if streaks >= 3 && streak_max <= 4 {
                    cluster_penalty *= 0.5;
                }

                if cluster_penalty > 0.0 {
                    quality = clamp(quality - cluster_penalty);
                    reasons.push(
                        "Missing telemetry is clustered (continuous gaps); confidence reduced."
                            .to_string(),
                    );
                }
            }
            quality
        } else {
            reasons.push("Missingness not provided; using neutral default.".to_string());
            0.6
        };

        // Stability
        let stability = if let Some(s) = signals.metric_stability {
            clamp(s)
        } else {
            match signals.computed_metrics_ok {
                Some(true) => 0.7,
                Some(false) => {
                    reasons.push(
                        "Some computations failed or were incomplete; confidence reduced."
                            .to_string(),
                    );
                    0.55
                }
                None => {
                    reasons
                        .push("Metric stability not provided; using neutral default.".to_string());
                    0.55
                }
            }
        };

        // Corroboration; absence is neutral, not a red flag.
        let corroboration = if let Some(c) = signals.corroboration {
            let c = clamp(c);
            if c >= 0.7 {
                reasons.push("Independent evidence corroborates the finding.".to_string());
            }
            c
        } else {
            0.5
        };

        // Contradictions
        let contradictions = signals.contradictions.unwrap_or(0);
        let contradiction = if contradictions <= 0 {
            1.0
        } else {
            reasons.push("Contradictory signals detected; confidence reduced.".to_string());
            clamp(1.0 - 0.25 * contradictions as f64)
        };

        let score = clamp(
            self.w_coverage * coverage
                + self.w_quality * quality
                + self.w_corroboration * corroboration
                + self.w_stability * stability
                + self.w_contradiction * contradiction,
        );

        let (mut band, mut escalation) = if score >= self.high_threshold {
            (Band::High, Escalation::None)
        } else if score >= self.medium_threshold {
            (Band::Medium, Escalation::None)
        } else {
            (Band::Low, Escalation::AskFollowup)
        };

        // Failed computations cap the outcome regardless of the score.
        if signals.computed_metrics_ok == Some(false) {
            band = Band::Low;
            escalation = Escalation::AskFollowup;
        }

        if reasons.is_empty() {
            reasons.push("Sufficient support for the conclusion at current confidence criteria.".to_string());
        }

        debug!(
            intent = context.unwrap_or("-"),
            score,
            band = band.as_str(),
            "confidence scored"
        );

        ConfidenceResult {
            band,
            reasons,
            escalation,
            score,
            breakdown: ConfidenceBreakdown {
                coverage,
                quality,
                corroboration,
                stability,
                contradiction,
            },
            signals: signals.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_signals_yields_medium_with_default_reasons() {
        let engine = ConfidenceEngine::default();
        let res = engine.score(&ConfidenceSignals::default(), None);
        // 0.25*0.6 + 0.25*0.6 + 0.20*0.5 + 0.20*0.55 + 0.10*1.0 = 0.61
        assert!((res.score - 0.61).abs() < 1e-9);
        assert_eq!(res.band, Band::Medium);
        assert_eq!(res.escalation, Escalation::None);
        assert_eq!(res.reasons.len(), 3);
    }

    #[test]
    fn clean_signals_yield_generic_reason() {
        let engine = ConfidenceEngine::default();
        let signals = ConfidenceSignals {
            missing_rows: Some(0),
            total_rows: Some(1344),
            computed_metrics_ok: Some(true),
            metric_stability: Some(0.9),
            ..Default::default()
        };
        let res = engine.score(&signals, Some("trend"));
        assert_eq!(res.band, Band::High);
        assert_eq!(
            res.reasons,
            vec!["Sufficient support for the conclusion at current confidence criteria.".to_string()]
        );
    }

    #[test]
    fn scattered_penalty_is_halved() {
        let engine = ConfidenceEngine::default();
        let base = ConfidenceSignals {
            missing_rows: Some(12),
            total_rows: Some(1344),
            computed_metrics_ok: Some(true),
            ..Default::default()
        };
        let scattered = ConfidenceSignals {
            missing_streak_max: Some(4),
            missing_streaks: Some(3),
            ..base.clone()
        };
        let clustered = ConfidenceSignals {
            missing_streak_max: Some(4),
            missing_streaks: Some(1),
            ..base
        };
        let s = engine.score(&scattered, None);
        let c = engine.score(&clustered, None);
        assert!(s.score > c.score);
        assert!((s.breakdown.quality - (c.breakdown.quality + 0.025)).abs() < 1e-9);
    }

    #[test]
    fn cluster_penalties_are_additive() {
        let engine = ConfidenceEngine::default();
        let signals = ConfidenceSignals {
            missing_rows: Some(16),
            total_rows: Some(1344),
            missing_streak_max: Some(16),
            missing_streaks: Some(1),
            computed_metrics_ok: Some(true),
            ..Default::default()
        };
        let res = engine.score(&signals, None);
        let miss_ratio = 16.0 / 1344.0;
        let expected = (1.0 - miss_ratio * 1.2) - (0.05 + 0.07 + 0.10);
        assert!((res.breakdown.quality - expected).abs() < 1e-9);
    }

    #[test]
    fn failed_metrics_force_low_even_on_high_score() {
        let engine = ConfidenceEngine::default();
        let signals = ConfidenceSignals {
            coverage_ratio: Some(1.0),
            missing_rows: Some(0),
            total_rows: Some(1000),
            corroboration: Some(1.0),
            metric_stability: Some(1.0),
            computed_metrics_ok: Some(false),
            ..Default::default()
        };
        let res = engine.score(&signals, None);
        assert!(res.score >= engine.high_threshold);
        assert_eq!(res.band, Band::Low);
        assert_eq!(res.escalation, Escalation::AskFollowup);
    }

    #[test]
    fn contradictions_penalize_linearly() {
        let engine = ConfidenceEngine::default();
        let signals = ConfidenceSignals {
            contradictions: Some(2),
            ..Default::default()
        };
        let res = engine.score(&signals, None);
        assert!((res.breakdown.contradiction - 0.5).abs() < 1e-9);
        assert!(res
            .reasons
            .iter()
            .any(|r| r.contains("Contradictory signals")));
    }
}
