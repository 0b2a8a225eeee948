use chrono::{Duration, NaiveDate};

use crate::history::LogHistory;
use crate::models::{CyclePhase, CycleStatus, DayClassification, DayStatus, FertilityWindow};
use crate::projection::{project_period_days, PeriodWindow};

// Fixed offsets from the cycle start, independent of cycle length.
const OVULATION_DAY_INDEX: i64 = 13;
const FERTILE_FIRST_INDEX: i64 = 11;
const FERTILE_LAST_INDEX: i64 = 15;

/// Pick the start date that day-of-cycle offsets are counted from:
/// the last inferred start, then the configured fallback, then today.
pub fn resolve_anchor(
    last_period_start: Option<NaiveDate>,
    fallback: Option<NaiveDate>,
    today: NaiveDate,
) -> NaiveDate {
    last_period_start.or(fallback).unwrap_or(today)
}

/// Zero-based day of cycle, floor-mod normalized into `[0, cycle_length)`
/// so dates before the anchor still land inside a cycle.
pub fn day_of_cycle(target: NaiveDate, anchor: NaiveDate, cycle_length: i64) -> i64 {
    (target - anchor).num_days().rem_euclid(cycle_length.max(1))
}

/// Display phase for a zero-based day of cycle.
pub fn phase_for_day(day_index: i64, period_length: i64) -> CyclePhase {
    let cycle_day = day_index + 1;
    if cycle_day <= period_length {
        CyclePhase::Menstrual
    } else if (13..=15).contains(&cycle_day) {
        CyclePhase::Ovulatory
    } else if cycle_day > 15 {
        CyclePhase::Luteal
    } else {
        CyclePhase::Follicular
    }
}

fn predicted_status(day_index: i64, period_length: i64) -> DayStatus {
    if day_index < period_length {
        DayStatus::Period
    } else if day_index == OVULATION_DAY_INDEX {
        DayStatus::Ovulation
    } else if (FERTILE_FIRST_INDEX..=FERTILE_LAST_INDEX).contains(&day_index) {
        DayStatus::Fertile
    } else {
        DayStatus::Normal
    }
}

/// Classify one day, projecting the inferred period window from `history`.
pub fn classify_day(
    date: NaiveDate,
    today: NaiveDate,
    history: &LogHistory,
    anchor: NaiveDate,
    cycle_length: i64,
    period_length: i64,
) -> DayClassification {
    let window = project_period_days(history, period_length);
    classify_day_with_window(date, today, history, &window, anchor, cycle_length, period_length)
}

/// Classify one day against a precomputed period window.
///
/// Logged or inferred period days win. Any other past day is `Normal`:
/// the forward prediction is never painted over history.
pub fn classify_day_with_window(
    date: NaiveDate,
    today: NaiveDate,
    history: &LogHistory,
    window: &PeriodWindow,
    anchor: NaiveDate,
    cycle_length: i64,
    period_length: i64,
) -> DayClassification {
    let day_index = day_of_cycle(date, anchor, cycle_length);

    let (status, known) = if history.has_flow_on(date) || window.contains(&date) {
        (DayStatus::Period, true)
    } else if date < today {
        (DayStatus::Normal, true)
    } else {
        (predicted_status(day_index, period_length), false)
    };

    DayClassification {
        date,
        status,
        cycle_day: (day_index + 1) as u32,
        phase: phase_for_day(day_index, period_length),
        known,
    }
}

/// Where `today` sits in the predicted cycle.
pub fn cycle_status(
    today: NaiveDate,
    anchor: NaiveDate,
    cycle_length: i64,
    period_length: i64,
) -> CycleStatus {
    let cycle_length = cycle_length.max(1);
    let day_index = day_of_cycle(today, anchor, cycle_length);
    let cycle_day = day_index + 1;

    CycleStatus {
        cycle_day: cycle_day as u32,
        phase: phase_for_day(day_index, period_length),
        period_active: cycle_day <= period_length,
        days_until_next_period: (cycle_length - cycle_day + 1) as u32,
    }
}

/// Fertile window of the cycle containing `today`, or of the next cycle
/// once this one's window has passed.
pub fn fertility_window(
    today: NaiveDate,
    anchor: NaiveDate,
    cycle_length: i64,
) -> Option<FertilityWindow> {
    let cycle_length = cycle_length.max(1);
    let day_index = day_of_cycle(today, anchor, cycle_length);
    let mut cycle_start = today.checked_sub_signed(Duration::days(day_index))?;
    if day_index > FERTILE_LAST_INDEX {
        cycle_start = cycle_start.checked_add_signed(Duration::days(cycle_length))?;
    }

    let offset = |days: i64| cycle_start.checked_add_signed(Duration::days(days));
    Some(FertilityWindow {
        fertile_start: offset(FERTILE_FIRST_INDEX)?,
        fertile_end: offset(FERTILE_LAST_INDEX)?,
        ovulation_day: offset(OVULATION_DAY_INDEX)?,
    })
}
