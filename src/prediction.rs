use chrono::{Duration, NaiveDate};

use crate::detection::detect_period_starts;
use crate::history::LogHistory;
use crate::models::{CycleStats, Prediction, Regularity};

/// Cycle lengths outside this open range are logging gaps or noise.
const MIN_CYCLE_EXCLUSIVE: i64 = 15;
const MAX_CYCLE_EXCLUSIVE: i64 = 100;
/// Number of most recent cycles feeding the rolling average.
const ROLLING_WINDOW: usize = 3;

/// Derive cycle statistics from a log history.
pub fn compute_cycle_stats(history: &LogHistory, default_cycle_length: i64) -> CycleStats {
    let starts = detect_period_starts(history);
    stats_from_starts(&starts, default_cycle_length)
}

/// Derive cycle statistics from period starts sorted oldest first.
pub fn stats_from_starts(starts: &[NaiveDate], default_cycle_length: i64) -> CycleStats {
    let cycle_history: Vec<i64> = starts
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|&len| len > MIN_CYCLE_EXCLUSIVE && len < MAX_CYCLE_EXCLUSIVE)
        .collect();

    let recent = &cycle_history[cycle_history.len().saturating_sub(ROLLING_WINDOW)..];
    let average_length = if recent.is_empty() {
        default_cycle_length
    } else {
        mean(recent).round() as i64
    };

    let last_period_start = starts.last().copied();

    tracing::debug!(
        starts = starts.len(),
        valid_cycles = cycle_history.len(),
        average_length,
        "computed cycle stats"
    );

    CycleStats {
        average_length,
        last_period_start,
        predicted_next_period: last_period_start
            .and_then(|start| start.checked_add_signed(Duration::days(average_length))),
        shortest_cycle: cycle_history.iter().copied().min(),
        longest_cycle: cycle_history.iter().copied().max(),
        total_cycles: starts.len(),
        cycle_history,
    }
}

/// Predict the next period from the active anchor.
/// Returns `None` when there is no anchor to count from.
pub fn predict_next_period(
    stats: &CycleStats,
    anchor: Option<NaiveDate>,
    period_length: i64,
) -> Option<Prediction> {
    let anchor = anchor?;
    let predicted_start = anchor.checked_add_signed(Duration::days(stats.average_length))?;
    let predicted_end =
        predicted_start.checked_add_signed(Duration::days((period_length - 1).max(0)))?;

    let confidence = if stats.cycle_history.len() < 2 {
        0.5
    } else {
        let std_dev = cycle_variability(&stats.cycle_history);
        (1.0 - (std_dev / stats.average_length.max(1) as f64) as f32).clamp(0.1, 0.95)
    };

    Some(Prediction {
        predicted_start,
        predicted_end,
        confidence,
    })
}

/// Sample standard deviation of the cycle lengths, zero below two cycles.
pub fn cycle_variability(cycle_lengths: &[i64]) -> f64 {
    std_deviation(cycle_lengths)
}

pub fn regularity(variability: f64) -> Regularity {
    if variability <= 2.0 {
        Regularity::Stable
    } else if variability <= 7.0 {
        Regularity::Variable
    } else {
        Regularity::Irregular
    }
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

fn std_deviation(values: &[i64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values
        .iter()
        .map(|&v| (v as f64 - avg).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn starts(dates: &[&str]) -> Vec<NaiveDate> {
        dates.iter().map(|d| date(d)).collect()
    }

    #[test]
    fn falls_back_without_cycles() {
        let stats = stats_from_starts(&starts(&["2026-01-01"]), 28);
        assert_eq!(stats.average_length, 28);
        assert_eq!(stats.last_period_start, Some(date("2026-01-01")));
        assert_eq!(stats.predicted_next_period, Some(date("2026-01-29")));
        assert!(stats.cycle_history.is_empty());
        assert_eq!(stats.total_cycles, 1);
    }

    #[test]
    fn empty_starts() {
        let stats = stats_from_starts(&[], 30);
        assert_eq!(stats.average_length, 30);
        assert_eq!(stats.last_period_start, None);
        assert_eq!(stats.predicted_next_period, None);
        assert_eq!(stats.shortest_cycle, None);
    }

    #[test]
    fn averages_last_three_cycles() {
        // 30, 26, 29, 27 -> last three average 27.33 -> 27
        let stats = stats_from_starts(
            &starts(&[
                "2026-01-01",
                "2026-01-31",
                "2026-02-26",
                "2026-03-27",
                "2026-04-23",
            ]),
            28,
        );
        assert_eq!(stats.cycle_history, vec![30, 26, 29, 27]);
        assert_eq!(stats.average_length, 27);
        assert_eq!(stats.shortest_cycle, Some(26));
        assert_eq!(stats.longest_cycle, Some(30));
    }

    #[test]
    fn rejects_outlier_lengths() {
        // 120-day gap and a 10-day blip are both discarded.
        let stats = stats_from_starts(
            &starts(&["2025-01-01", "2025-05-01", "2025-05-11", "2025-06-08"]),
            28,
        );
        assert_eq!(stats.cycle_history, vec![28]);
        assert_eq!(stats.average_length, 28);
    }

    #[test]
    fn range_bounds_are_exclusive() {
        let stats = stats_from_starts(&starts(&["2025-01-01", "2025-01-16", "2025-04-26"]), 28);
        // 15 and 100 days are both outside (15, 100).
        assert!(stats.cycle_history.is_empty());
    }

    #[test]
    fn rounds_half_up() {
        // 27, 28 -> 27.5 -> 28
        let stats = stats_from_starts(&starts(&["2025-01-01", "2025-01-28", "2025-02-25"]), 30);
        assert_eq!(stats.average_length, 28);
    }

    #[test]
    fn prediction_needs_anchor() {
        let stats = stats_from_starts(&[], 28);
        assert!(predict_next_period(&stats, None, 5).is_none());
    }

    #[test]
    fn predicts_from_anchor() {
        let stats = stats_from_starts(&starts(&["2026-01-01", "2026-01-29"]), 28);
        let pred = predict_next_period(&stats, stats.last_period_start, 5).unwrap();
        assert_eq!(pred.predicted_start, date("2026-02-26"));
        assert_eq!(pred.predicted_end, date("2026-03-02"));
        assert_eq!(pred.confidence, 0.5);
    }

    #[test]
    fn steady_cycles_are_confident() {
        let stats = stats_from_starts(
            &starts(&["2026-01-01", "2026-01-29", "2026-02-26", "2026-03-26"]),
            28,
        );
        let pred = predict_next_period(&stats, stats.last_period_start, 5).unwrap();
        assert_eq!(pred.confidence, 0.95);
        assert_eq!(regularity(cycle_variability(&stats.cycle_history)), Regularity::Stable);
    }

    #[test]
    fn variability_classes() {
        assert_eq!(cycle_variability(&[28]), 0.0);
        assert_eq!(regularity(cycle_variability(&[22, 28, 34])), Regularity::Variable);
        assert_eq!(regularity(cycle_variability(&[20, 40, 60])), Regularity::Irregular);
    }
}
