use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use cykel::phase::day_of_cycle;
use cykel::projection::project_from_starts;
use cykel::{
    classify_day, compute_cycle_stats, detect_period_starts, project_period_days, FlowLevel,
    LogEntry, LogHistory,
};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn arb_flow() -> impl Strategy<Value = FlowLevel> {
    prop_oneof![
        Just(FlowLevel::None),
        Just(FlowLevel::Spotting),
        Just(FlowLevel::Light),
        Just(FlowLevel::Medium),
        Just(FlowLevel::Heavy),
    ]
}

fn arb_history() -> impl Strategy<Value = LogHistory> {
    prop::collection::vec((0i64..400, arb_flow()), 0..120).prop_map(|days| {
        LogHistory::from_entries(
            days.into_iter()
                .map(|(offset, flow)| (base() + Duration::days(offset), LogEntry::new(flow))),
        )
    })
}

proptest! {
    #[test]
    fn starts_follow_the_flow_rule(history in arb_history()) {
        let starts = detect_period_starts(&history);

        prop_assert!(starts.windows(2).all(|w| w[0] < w[1]));
        for (date, entry) in history.iter() {
            let is_start = entry.has_flow() && !history.has_flow_on(date - Duration::days(1));
            prop_assert_eq!(starts.contains(&date), is_start);
        }
    }

    #[test]
    fn stats_are_pure_and_bounded(history in arb_history(), default in 20i64..40) {
        let stats = compute_cycle_stats(&history, default);
        prop_assert_eq!(&stats, &compute_cycle_stats(&history, default));
        prop_assert!(stats.cycle_history.iter().all(|&len| len > 15 && len < 100));
        if stats.cycle_history.is_empty() {
            prop_assert_eq!(stats.average_length, default);
        } else {
            prop_assert!(stats.average_length > 15 && stats.average_length < 100);
        }
        prop_assert_eq!(stats.last_period_start, detect_period_starts(&history).last().copied());
    }

    #[test]
    fn projection_covers_each_start(history in arb_history(), period in 1i64..10) {
        let starts = detect_period_starts(&history);
        let window = project_period_days(&history, period);

        prop_assert_eq!(&window, &project_period_days(&history, period));
        prop_assert!(window.len() <= starts.len() * period as usize);
        for start in &starts {
            prop_assert!(window.contains(start));
            prop_assert!(window.contains(&(*start + Duration::days(period - 1))));
        }

        let mut reversed = starts.clone();
        reversed.reverse();
        prop_assert_eq!(window, project_from_starts(&reversed, period));
    }

    #[test]
    fn day_of_cycle_is_floor_mod(offset in -2000i64..2000, cycle in 1i64..100) {
        let anchor = base();
        let d = day_of_cycle(anchor + Duration::days(offset), anchor, cycle);
        prop_assert!((0..cycle).contains(&d));
        prop_assert_eq!((d - offset).rem_euclid(cycle), 0);
    }

    #[test]
    fn classification_is_pure(
        history in arb_history(),
        target in 0i64..400,
        today in 0i64..400,
    ) {
        let target = base() + Duration::days(target);
        let today = base() + Duration::days(today);
        let first = classify_day(target, today, &history, base(), 28, 5);
        prop_assert_eq!(&first, &classify_day(target, today, &history, base(), 28, 5));
        prop_assert!(first.cycle_day >= 1 && first.cycle_day <= 28);
        if history.has_flow_on(target) {
            prop_assert_eq!(first.status, cykel::DayStatus::Period);
        }
    }
}
