use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::detection::detect_period_starts;
use crate::history::LogHistory;

/// Days counted as period because they fall within `period_length` days of
/// an inferred start, whether or not each one was logged.
pub type PeriodWindow = BTreeSet<NaiveDate>;

pub fn project_period_days(history: &LogHistory, period_length: i64) -> PeriodWindow {
    project_from_starts(&detect_period_starts(history), period_length)
}

/// Union of `[start, start + period_length - 1]` over every start.
pub fn project_from_starts(starts: &[NaiveDate], period_length: i64) -> PeriodWindow {
    let mut window = PeriodWindow::new();
    for &start in starts {
        window.extend(
            (0..period_length.max(0))
                .map_while(|offset| start.checked_add_signed(Duration::days(offset))),
        );
    }
    window
}
