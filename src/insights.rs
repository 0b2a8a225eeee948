//! Symptom and mood trends over a time range.
//!
//! Each tagged log is attributed to a phase by looking ahead to the next
//! logged flow rather than by the predicted cycle, so the attribution
//! follows what actually happened.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::history::{LogEntry, LogHistory};
use crate::models::{
    InsightsReport, SymptomCorrelations, SymptomFrequency, SymptomPhase, TimeRange,
};
use crate::prediction::{compute_cycle_stats, cycle_variability, regularity};

/// How far ahead to look for the next logged flow.
const LOOKAHEAD_DAYS: i64 = 40;
const PMS_MAX_GAP: i64 = 7;
const OVULATORY_MAX_GAP: i64 = 16;

/// Entries dated strictly after `today - range`, oldest first.
pub fn filter_by_range(
    history: &LogHistory,
    range: TimeRange,
    today: NaiveDate,
) -> Vec<(NaiveDate, &LogEntry)> {
    match range.cutoff(today) {
        Some(cutoff) => history.iter().filter(|(date, _)| *date > cutoff).collect(),
        None => history.iter().collect(),
    }
}

/// Phase a tagged log belongs to, judged by the gap to the next flow day.
pub fn symptom_phase(date: NaiveDate, entry: &LogEntry, flow_dates: &[NaiveDate]) -> SymptomPhase {
    if entry.has_flow() {
        return SymptomPhase::Menstrual;
    }

    match next_flow_gap(date, flow_dates) {
        Some(gap) if gap <= PMS_MAX_GAP => SymptomPhase::LutealPms,
        Some(gap) if gap <= OVULATORY_MAX_GAP => SymptomPhase::Ovulatory,
        _ => SymptomPhase::Follicular,
    }
}

/// Days until the first flow strictly after `date`, within the lookahead.
fn next_flow_gap(date: NaiveDate, flow_dates: &[NaiveDate]) -> Option<i64> {
    let idx = flow_dates.partition_point(|d| *d <= date);
    let gap = (*flow_dates.get(idx)? - date).num_days();
    (gap <= LOOKAHEAD_DAYS).then_some(gap)
}

/// Count, per symptom, how often it was logged in each phase.
pub fn analyze_symptom_correlations(
    history: &LogHistory,
    range: TimeRange,
    today: NaiveDate,
) -> SymptomCorrelations {
    let entries = filter_by_range(history, range, today);
    correlate_tags(&entries, &history.flow_dates(), |e| &e.symptoms)
}

fn correlate_tags<F>(
    entries: &[(NaiveDate, &LogEntry)],
    flow_dates: &[NaiveDate],
    tags_of: F,
) -> SymptomCorrelations
where
    F: Fn(&LogEntry) -> &BTreeSet<String>,
{
    let mut correlations = SymptomCorrelations::new();
    for &(date, entry) in entries {
        let tags = tags_of(entry);
        if tags.is_empty() {
            continue;
        }
        let phase = symptom_phase(date, entry, flow_dates);
        for tag in tags {
            correlations.entry(tag.clone()).or_default().increment(phase);
        }
    }
    correlations
}

fn tag_frequencies<F>(
    entries: &[(NaiveDate, &LogEntry)],
    correlations: &SymptomCorrelations,
    top_n: usize,
    tags_of: F,
) -> Vec<SymptomFrequency>
where
    F: Fn(&LogEntry) -> &BTreeSet<String>,
{
    let total = entries.len().max(1) as f64;

    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for &(_, entry) in entries {
        for tag in tags_of(entry) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut frequencies: Vec<SymptomFrequency> = counts
        .into_iter()
        .map(|(tag, count)| SymptomFrequency {
            tag: tag.to_string(),
            count,
            percentage: (count as f64 / total * 100.0).round() as u32,
            common_phase: correlations.get(tag).and_then(|c| c.common_phase()),
        })
        .collect();

    // Stable sort keeps alphabetical order among equal counts.
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    frequencies.truncate(top_n);
    frequencies
}

/// Most frequent symptoms in the range, with their common phase.
pub fn symptom_frequencies(
    history: &LogHistory,
    range: TimeRange,
    today: NaiveDate,
    top_n: usize,
) -> Vec<SymptomFrequency> {
    let entries = filter_by_range(history, range, today);
    let correlations = correlate_tags(&entries, &history.flow_dates(), |e| &e.symptoms);
    tag_frequencies(&entries, &correlations, top_n, |e| &e.symptoms)
}

/// Most frequent moods in the range, with their common phase.
pub fn mood_frequencies(
    history: &LogHistory,
    range: TimeRange,
    today: NaiveDate,
    top_n: usize,
) -> Vec<SymptomFrequency> {
    let entries = filter_by_range(history, range, today);
    let correlations = correlate_tags(&entries, &history.flow_dates(), |e| &e.moods);
    tag_frequencies(&entries, &correlations, top_n, |e| &e.moods)
}

pub fn build_insights(
    history: &LogHistory,
    range: TimeRange,
    today: NaiveDate,
    default_cycle_length: i64,
    top_n: usize,
) -> InsightsReport {
    let entries = filter_by_range(history, range, today);
    let flow_dates = history.flow_dates();

    let correlations = correlate_tags(&entries, &flow_dates, |e| &e.symptoms);
    let mood_correlations = correlate_tags(&entries, &flow_dates, |e| &e.moods);
    let top_symptoms = tag_frequencies(&entries, &correlations, top_n, |e| &e.symptoms);
    let top_moods = tag_frequencies(&entries, &mood_correlations, top_n, |e| &e.moods);

    let stats = compute_cycle_stats(history, default_cycle_length);
    let variability = cycle_variability(&stats.cycle_history);

    tracing::debug!(
        ?range,
        entries = entries.len(),
        symptoms = correlations.len(),
        "built insights report"
    );

    InsightsReport {
        range,
        total_entries: entries.len(),
        average_cycle_length: stats.average_length,
        cycle_history: stats.cycle_history,
        variability,
        regularity: regularity(variability),
        top_symptoms,
        top_moods,
        correlations,
    }
}
