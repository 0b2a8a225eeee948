use std::collections::BTreeMap;
use std::fmt;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::history::LogEntry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleStats {
    /// Rounded mean of the last three valid cycle lengths, or the default.
    pub average_length: i64,
    pub last_period_start: Option<NaiveDate>,
    /// Every valid cycle length, oldest first.
    pub cycle_history: Vec<i64>,
    pub predicted_next_period: Option<NaiveDate>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub total_cycles: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Period,
    Ovulation,
    Fertile,
    Normal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CyclePhase::Menstrual => "Menstrual Phase",
            CyclePhase::Follicular => "Follicular Phase",
            CyclePhase::Ovulatory => "Ovulatory Phase",
            CyclePhase::Luteal => "Luteal Phase",
        };
        f.write_str(label)
    }
}

/// Phase attributed to a symptom log by looking ahead to the next period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymptomPhase {
    Menstrual,
    Follicular,
    Ovulatory,
    #[serde(rename = "Luteal (PMS)")]
    LutealPms,
}

impl fmt::Display for SymptomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SymptomPhase::Menstrual => "Menstrual",
            SymptomPhase::Follicular => "Follicular",
            SymptomPhase::Ovulatory => "Ovulatory",
            SymptomPhase::LutealPms => "Luteal (PMS)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    LastThreeMonths,
    LastSixMonths,
    AllTime,
}

impl TimeRange {
    pub fn months(self) -> Option<u32> {
        match self {
            TimeRange::LastThreeMonths => Some(3),
            TimeRange::LastSixMonths => Some(6),
            TimeRange::AllTime => None,
        }
    }

    /// Entries must be strictly after this date to fall inside the range.
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        self.months()
            .and_then(|m| today.checked_sub_months(Months::new(m)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FertilityWindow {
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub ovulation_day: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayClassification {
    pub date: NaiveDate,
    pub status: DayStatus,
    /// 1-indexed day of the cycle.
    pub cycle_day: u32,
    pub phase: CyclePhase,
    /// True when the status came from logged or inferred data rather than
    /// the forward prediction.
    pub known: bool,
}

/// Summary for the "today" card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleStatus {
    pub cycle_day: u32,
    pub phase: CyclePhase,
    pub period_active: bool,
    pub days_until_next_period: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub cycle_day: u32,
    pub phase: CyclePhase,
    pub is_today: bool,
    pub entry: Option<LogEntry>,
}

/// Data returned to the presentation layer for a month view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub prediction: Option<Prediction>,
    pub fertility: Option<FertilityWindow>,
    pub stats: CycleStats,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Regularity {
    Stable,
    Variable,
    Irregular,
}

/// Occurrence counts per phase, kept in first-encountered order so that
/// ties resolve to the phase seen first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseCounts {
    counts: Vec<(SymptomPhase, u32)>,
}

impl PhaseCounts {
    pub fn increment(&mut self, phase: SymptomPhase) {
        match self.counts.iter_mut().find(|(p, _)| *p == phase) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((phase, 1)),
        }
    }

    pub fn get(&self, phase: SymptomPhase) -> u32 {
        self.counts
            .iter()
            .find(|(p, _)| *p == phase)
            .map_or(0, |(_, c)| *c)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymptomPhase, u32)> + '_ {
        self.counts.iter().copied()
    }

    /// Phase with the highest count; the earliest-encountered wins a tie.
    pub fn common_phase(&self) -> Option<SymptomPhase> {
        let mut best: Option<(SymptomPhase, u32)> = None;
        for &(phase, count) in &self.counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((phase, count));
            }
        }
        best.map(|(phase, _)| phase)
    }
}

pub type SymptomCorrelations = BTreeMap<String, PhaseCounts>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymptomFrequency {
    pub tag: String,
    pub count: u32,
    /// Share of entries in the range carrying this tag, rounded to a whole percent.
    pub percentage: u32,
    pub common_phase: Option<SymptomPhase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsReport {
    pub range: TimeRange,
    pub total_entries: usize,
    pub average_cycle_length: i64,
    pub cycle_history: Vec<i64>,
    pub variability: f64,
    pub regularity: Regularity,
    pub top_symptoms: Vec<SymptomFrequency>,
    pub top_moods: Vec<SymptomFrequency>,
    pub correlations: SymptomCorrelations,
}
