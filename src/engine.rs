use std::fmt;

use chrono::{Local, NaiveDate};
use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::detection::detect_period_starts;
use crate::history::{date_key, LogHistory};
use crate::insights::build_insights;
use crate::models::{
    CalendarDay, CycleStats, CycleStatus, DayClassification, FertilityWindow, InsightsReport,
    MonthView, Prediction, TimeRange,
};
use crate::phase::{classify_day_with_window, cycle_status, fertility_window, resolve_anchor};
use crate::prediction::{predict_next_period, stats_from_starts};
use crate::projection::{project_from_starts, PeriodWindow};

/// SHA-256 over a log snapshot and the configuration that shapes the
/// derived values.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(history: &LogHistory, config: &EngineConfig) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(config.default_cycle_length.to_le_bytes());
        hasher.update(config.period_length.to_le_bytes());

        for (date, entry) in history.iter() {
            hasher.update(date_key(date).as_bytes());
            hasher.update([entry.flow.tag()]);
            for tag in &entry.symptoms {
                hasher.update((tag.len() as u64).to_le_bytes());
                hasher.update(tag.as_bytes());
            }
            hasher.update([0xfe]);
            for tag in &entry.moods {
                hasher.update((tag.len() as u64).to_le_bytes());
                hasher.update(tag.as_bytes());
            }
            hasher.update([0xff]);
            hasher.update((entry.notes.len() as u64).to_le_bytes());
            hasher.update(entry.notes.as_bytes());
        }

        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &hex::encode(self.0)[..12])
    }
}

/// Values derived from one snapshot, reused while the fingerprint holds.
#[derive(Debug)]
struct Derived {
    fingerprint: Fingerprint,
    starts: Vec<NaiveDate>,
    stats: CycleStats,
    window: PeriodWindow,
}

impl Derived {
    fn compute(history: &LogHistory, config: &EngineConfig, fingerprint: Fingerprint) -> Self {
        let starts = detect_period_starts(history);
        let stats = stats_from_starts(&starts, config.cycle_length_days());
        let window = project_from_starts(&starts, config.period_length_days());
        Self {
            fingerprint,
            starts,
            stats,
            window,
        }
    }
}

/// Query facade over log snapshots.
///
/// Every query takes the caller's current snapshot. Period starts, cycle
/// stats and the inferred period window are cached under the snapshot's
/// [`Fingerprint`] and recomputed as soon as the history or the
/// configuration changes.
#[derive(Debug)]
pub struct CycleEngine {
    config: EngineConfig,
    pinned_today: Option<NaiveDate>,
    cache: Option<Derived>,
}

impl Default for CycleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CycleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: config.clamped(),
            pinned_today: None,
            cache: None,
        }
    }

    /// Evaluate as if the local date were `today`.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config.clamped();
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn refresh<'a>(
        cache: &'a mut Option<Derived>,
        config: &EngineConfig,
        history: &LogHistory,
    ) -> &'a Derived {
        let fingerprint = Fingerprint::of(history, config);
        let derived = match cache.take() {
            Some(derived) if derived.fingerprint == fingerprint => {
                tracing::trace!(?fingerprint, "derived cache hit");
                derived
            }
            _ => {
                tracing::debug!(?fingerprint, entries = history.len(), "recomputing derived values");
                Derived::compute(history, config, fingerprint)
            }
        };
        cache.insert(derived)
    }

    pub fn period_starts(&mut self, history: &LogHistory) -> Vec<NaiveDate> {
        Self::refresh(&mut self.cache, &self.config, history)
            .starts
            .clone()
    }

    pub fn cycle_stats(&mut self, history: &LogHistory) -> CycleStats {
        Self::refresh(&mut self.cache, &self.config, history)
            .stats
            .clone()
    }

    pub fn period_window(&mut self, history: &LogHistory) -> PeriodWindow {
        Self::refresh(&mut self.cache, &self.config, history)
            .window
            .clone()
    }

    /// Start date the predictions count from.
    pub fn anchor(&mut self, history: &LogHistory) -> NaiveDate {
        let today = self.today();
        let derived = Self::refresh(&mut self.cache, &self.config, history);
        resolve_anchor(derived.stats.last_period_start, self.config.fallback_anchor, today)
    }

    pub fn classify(&mut self, history: &LogHistory, date: NaiveDate) -> DayClassification {
        let today = self.today();
        let derived = Self::refresh(&mut self.cache, &self.config, history);
        let anchor =
            resolve_anchor(derived.stats.last_period_start, self.config.fallback_anchor, today);
        classify_day_with_window(
            date,
            today,
            history,
            &derived.window,
            anchor,
            derived.stats.average_length,
            self.config.period_length_days(),
        )
    }

    pub fn status(&mut self, history: &LogHistory) -> CycleStatus {
        let today = self.today();
        let derived = Self::refresh(&mut self.cache, &self.config, history);
        let anchor =
            resolve_anchor(derived.stats.last_period_start, self.config.fallback_anchor, today);
        cycle_status(
            today,
            anchor,
            derived.stats.average_length,
            self.config.period_length_days(),
        )
    }

    pub fn predict(&mut self, history: &LogHistory) -> Option<Prediction> {
        let today = self.today();
        let derived = Self::refresh(&mut self.cache, &self.config, history);
        let anchor =
            resolve_anchor(derived.stats.last_period_start, self.config.fallback_anchor, today);
        predict_next_period(&derived.stats, Some(anchor), self.config.period_length_days())
    }

    /// Upcoming fertile window, only when the user has opted in.
    pub fn fertility(&mut self, history: &LogHistory) -> Option<FertilityWindow> {
        if !self.config.show_fertility {
            return None;
        }
        let today = self.today();
        let derived = Self::refresh(&mut self.cache, &self.config, history);
        let anchor =
            resolve_anchor(derived.stats.last_period_start, self.config.fallback_anchor, today);
        fertility_window(today, anchor, derived.stats.average_length)
    }

    /// Every day of a calendar month with its status. `None` for an
    /// invalid year/month.
    pub fn month(&mut self, history: &LogHistory, year: i32, month: u32) -> Option<MonthView> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }?;
        let last_day = next_month.pred_opt()?;

        let prediction = self.predict(history);
        let fertility = self.fertility(history);

        let today = self.today();
        let period_length = self.config.period_length_days();
        let derived = Self::refresh(&mut self.cache, &self.config, history);
        let anchor =
            resolve_anchor(derived.stats.last_period_start, self.config.fallback_anchor, today);

        let days = first_day
            .iter_days()
            .take_while(|d| *d <= last_day)
            .map(|date| {
                let day = classify_day_with_window(
                    date,
                    today,
                    history,
                    &derived.window,
                    anchor,
                    derived.stats.average_length,
                    period_length,
                );
                CalendarDay {
                    date,
                    status: day.status,
                    cycle_day: day.cycle_day,
                    phase: day.phase,
                    is_today: date == today,
                    entry: history.get(date).cloned(),
                }
            })
            .collect();

        Some(MonthView {
            year,
            month,
            days,
            prediction,
            fertility,
            stats: derived.stats.clone(),
        })
    }

    pub fn insights(&self, history: &LogHistory, range: TimeRange) -> InsightsReport {
        build_insights(
            history,
            range,
            self.today(),
            self.config.cycle_length_days(),
            self.config.top_symptoms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{FlowLevel, LogEntry};
    use crate::models::{CyclePhase, DayStatus};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn two_cycles() -> LogHistory {
        LogHistory::from_entries([
            (date("2024-01-01"), LogEntry::new(FlowLevel::Heavy)),
            (date("2024-01-02"), LogEntry::new(FlowLevel::Medium)),
            (date("2024-01-31"), LogEntry::new(FlowLevel::Heavy)),
        ])
    }

    #[test]
    fn fingerprint_tracks_content_and_config() {
        let history = two_cycles();
        let config = EngineConfig::default();
        let base = Fingerprint::of(&history, &config);
        assert_eq!(base, Fingerprint::of(&history.clone(), &config));

        let mut edited = history.clone();
        edited.upsert(date("2024-01-02"), LogEntry::new(FlowLevel::Light));
        assert_ne!(base, Fingerprint::of(&edited, &config));

        let longer = EngineConfig {
            period_length: 6,
            ..EngineConfig::default()
        };
        assert_ne!(base, Fingerprint::of(&history, &longer));
        assert_eq!(base.to_string().len(), 64);
    }

    #[test]
    fn recomputes_after_edit() {
        let mut engine = CycleEngine::default().with_today(date("2024-02-10"));
        let mut history = two_cycles();

        assert_eq!(engine.cycle_stats(&history).average_length, 30);

        history.upsert(date("2024-03-01"), LogEntry::new(FlowLevel::Medium));
        let stats = engine.cycle_stats(&history);
        assert_eq!(stats.cycle_history, vec![30, 30]);
        assert_eq!(stats.last_period_start, Some(date("2024-03-01")));
    }

    #[test]
    fn config_change_invalidates_window() {
        let mut engine = CycleEngine::default().with_today(date("2024-02-10"));
        let history = two_cycles();
        assert_eq!(engine.period_window(&history).len(), 10);

        engine.set_config(EngineConfig {
            period_length: 3,
            ..EngineConfig::default()
        });
        assert_eq!(engine.period_window(&history).len(), 6);
    }

    #[test]
    fn anchor_falls_back_to_config_then_today() {
        let history = LogHistory::new();
        let mut engine = CycleEngine::new(EngineConfig {
            fallback_anchor: Some(date("2024-05-01")),
            ..EngineConfig::default()
        })
        .with_today(date("2024-05-20"));
        assert_eq!(engine.anchor(&history), date("2024-05-01"));

        let mut bare = CycleEngine::default().with_today(date("2024-05-20"));
        assert_eq!(bare.anchor(&history), date("2024-05-20"));
        assert_eq!(bare.status(&history).cycle_day, 1);
    }

    #[test]
    fn classifies_with_learned_cycle_length() {
        let mut engine = CycleEngine::default().with_today(date("2024-02-10"));
        let history = two_cycles();

        // Anchor 2024-01-31, average 30: 2024-03-01 starts the next cycle.
        let next = engine.classify(&history, date("2024-03-01"));
        assert_eq!(next.status, DayStatus::Period);
        assert_eq!(next.cycle_day, 1);
        assert!(!next.known);

        let ovulation = engine.classify(&history, date("2024-02-13"));
        assert_eq!(ovulation.status, DayStatus::Ovulation);
        assert_eq!(ovulation.phase, CyclePhase::Ovulatory);
    }

    #[test]
    fn month_view_covers_every_day() {
        let mut engine = CycleEngine::default().with_today(date("2024-02-10"));
        let history = two_cycles();

        let view = engine.month(&history, 2024, 2).unwrap();
        assert_eq!(view.days.len(), 29);
        assert!(view.days.iter().filter(|d| d.is_today).count() == 1);
        assert_eq!(view.days[0].status, DayStatus::Period);
        assert_eq!(view.days[5].status, DayStatus::Normal);
        assert!(view.prediction.is_some());
        assert!(view.fertility.is_none());

        assert!(engine.month(&history, 2024, 13).is_none());
        assert_eq!(engine.month(&history, 2023, 12).unwrap().days.len(), 31);
    }

    #[test]
    fn fertility_only_when_enabled() {
        let history = two_cycles();
        let mut engine = CycleEngine::new(EngineConfig {
            show_fertility: true,
            ..EngineConfig::default()
        })
        .with_today(date("2024-02-05"));

        let window = engine.fertility(&history).unwrap();
        assert_eq!(window.ovulation_day, date("2024-02-13"));
    }
}
