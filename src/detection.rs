use chrono::NaiveDate;

use crate::history::LogHistory;

/// Infer period starts from flow logs, oldest first.
///
/// A day starts a period when it has flow and the calendar day before it
/// either has no entry or has an entry without flow. A lone flow day is a
/// start of its own.
pub fn detect_period_starts(history: &LogHistory) -> Vec<NaiveDate> {
    let starts: Vec<NaiveDate> = history
        .iter()
        .filter(|(_, entry)| entry.has_flow())
        .map(|(date, _)| date)
        .filter(|date| !date.pred_opt().is_some_and(|prev| history.has_flow_on(prev)))
        .collect();

    tracing::trace!(entries = history.len(), starts = starts.len(), "detected period starts");
    starts
}
