//! Property-based tests for schedule date arithmetic.

use chrono::{Datelike, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::recurring::service::RecurringScheduler;
use crate::recurring::types::Frequency;

proptest! {
    /// Monthly advancement lands `interval` months later, on the same day
    /// or the last day of a shorter month.
    #[test]
    fn prop_monthly_is_calendar_based(
        year in 2000i32..2100,
        month in 1u32..=12,
        day in 1u32..=31,
        interval in 1u32..24,
    ) {
        let Some(start) = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single() else {
            return Ok(());
        };
        let next = RecurringScheduler::advance(start, Frequency::Monthly, interval, None).unwrap();

        let months = start.year() * 12 + start.month0() as i32 + interval as i32;
        prop_assert_eq!(next.year(), months.div_euclid(12));
        prop_assert_eq!(next.month0() as i32, months.rem_euclid(12));
        prop_assert!(next.day() <= start.day());
        if next.day() < start.day() {
            // clamped: the following day is in the next month
            prop_assert_eq!((next + Duration::days(1)).day(), 1);
        }
    }

    /// Anchored monthly runs never drift: every run is on the anchor day or,
    /// in shorter months, the month's last day.
    #[test]
    fn prop_anchored_monthly_does_not_drift(
        month in 1u32..=12,
        anchor in 28u32..=31,
        steps in 1usize..30,
    ) {
        let Some(start) = Utc.with_ymd_and_hms(2026, month, anchor, 9, 0, 0).single() else {
            return Ok(());
        };
        let mut run = start;
        for _ in 0..steps {
            run = RecurringScheduler::advance(run, Frequency::Monthly, 1, Some(anchor)).unwrap();
            let clamped = run.day() < anchor;
            prop_assert!(run.day() <= anchor);
            if clamped {
                prop_assert_eq!((run + Duration::days(1)).day(), 1);
            }
        }
    }

    /// Day-based frequencies add a fixed number of days.
    #[test]
    fn prop_daily_adds_days(offset in 0i64..20_000, interval in 1u32..100) {
        let start = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap() + Duration::days(offset);
        let next = RecurringScheduler::advance(start, Frequency::Weekly, interval, None).unwrap();
        prop_assert_eq!(next - start, Duration::days(7 * i64::from(interval)));
    }
}
