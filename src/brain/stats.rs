//! Narrow statistics shared by the analytic intents.

use chrono::{DateTime, Utc};

use crate::adapters::{Signal, TelemetryRow};

/// Timestamped numeric sample, sorted ascending by time.
pub type Point = (DateTime<Utc>, f64);

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Extract the valid numeric samples of one signal, sorted by timestamp.
/// Missing placeholder rows carry no value and drop out here.
pub fn numeric_points(rows: &[TelemetryRow], signal: Signal) -> Vec<Point> {
    let mut out: Vec<Point> = rows
        .iter()
        .filter_map(|r| r.numeric(signal).map(|v| (r.timestamp, v)))
        .collect();
    out.sort_by_key(|(t, _)| *t);
    out
}

/// Slope estimate: `(mean(last 10%) - mean(first 10%)) / days spanned`.
/// Requires at least 20 points; the tail size is floored at 3.
pub fn slope_per_day(points: &[Point]) -> Option<f64> {
    if points.len() < 20 {
        return None;
    }

    let n = points.len();
    let k = usize::max(3, n / 10);
    let first: Vec<f64> = points[..k].iter().map(|(_, v)| *v).collect();
    let last: Vec<f64> = points[n - k..].iter().map(|(_, v)| *v).collect();
    let m1 = mean(&first)?;
    let m2 = mean(&last)?;

    let t0 = points[0].0;
    let t1 = points[n - 1].0;
    let days = ((t1 - t0).num_seconds() as f64 / 86_400.0).max(1e-6);
    Some((m2 - m1) / days)
}

/// Nearest-rank percentile: sort ascending, index `round((n-1) * p)` clamped
/// to the valid range.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = (((sorted.len() - 1) as f64) * p).round() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// Missing-gap clustering statistics over adapter rows in query order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapStats {
    pub missing_rows: u64,
    pub missing_streak_max: u64,
    pub missing_streaks: u64,
}

pub fn gap_stats(rows: &[TelemetryRow]) -> GapStats {
    let mut stats = GapStats::default();
    let mut streak = 0u64;

    for row in rows {
        if row.data_quality_flag.is_missing() {
            stats.missing_rows += 1;
            streak += 1;
        } else if streak > 0 {
            stats.missing_streaks += 1;
            stats.missing_streak_max = stats.missing_streak_max.max(streak);
            streak = 0;
        }
    }
    if streak > 0 {
        stats.missing_streaks += 1;
        stats.missing_streak_max = stats.missing_streak_max.max(streak);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{parse_iso, QualityFlag};

    fn row(ts: &str, soh: Option<f64>, missing: bool) -> TelemetryRow {
        TelemetryRow {
            timestamp: parse_iso(ts).unwrap(),
            soc: None,
            soh,
            temperature: None,
            power: None,
            status: None,
            data_quality_flag: if missing {
                QualityFlag::Missing
            } else {
                QualityFlag::Ok
            },
        }
    }

    #[test]
    fn percentile_nearest_rank() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.50), Some(3.0));
        assert_eq!(percentile(&values, 0.95), Some(5.0));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn slope_requires_twenty_points() {
        let points: Vec<Point> = (0..19)
            .map(|i| {
                (
                    parse_iso(&format!("2025-12-01T{:02}:00:00Z", i)).unwrap(),
                    100.0 - i as f64,
                )
            })
            .collect();
        assert_eq!(slope_per_day(&points), None);
    }

    #[test]
    fn slope_tracks_linear_decline() {
        // One point per hour for 100 hours, dropping 0.1 per hour.
        let points: Vec<Point> = (0..100)
            .map(|i| {
                let day = i / 24;
                let hour = i % 24;
                (
                    parse_iso(&format!("2025-12-{:02}T{:02}:00:00Z", day + 1, hour)).unwrap(),
                    100.0 - 0.1 * i as f64,
                )
            })
            .collect();
        let slope = slope_per_day(&points).unwrap();
        // 0.1/hour = 2.4/day; the 10% tail means the estimate is close, not exact.
        assert!((slope + 2.4).abs() < 0.1, "slope = {slope}");
    }

    #[test]
    fn gap_stats_count_streaks() {
        let rows = vec![
            row("2025-12-01T00:00:00Z", Some(99.0), false),
            row("2025-12-01T00:15:00Z", None, true),
            row("2025-12-01T00:30:00Z", None, true),
            row("2025-12-01T00:45:00Z", Some(99.0), false),
            row("2025-12-01T01:00:00Z", None, true),
        ];
        let stats = gap_stats(&rows);
        assert_eq!(stats.missing_rows, 3);
        assert_eq!(stats.missing_streaks, 2);
        assert_eq!(stats.missing_streak_max, 2);
    }

    #[test]
    fn numeric_points_drop_missing_and_sort() {
        let rows = vec![
            row("2025-12-01T01:00:00Z", Some(98.0), false),
            row("2025-12-01T00:00:00Z", Some(99.0), false),
            row("2025-12-01T00:30:00Z", None, true),
        ];
        let points = numeric_points(&rows, Signal::Soh);
        assert_eq!(points.len(), 2);
        assert!(points[0].0 < points[1].0);
        assert_eq!(points[0].1, 99.0);
    }
}
