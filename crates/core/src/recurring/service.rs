//! Calendar arithmetic and due checks for recurring schedules.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use thiserror::Error;

use procura_shared::AppError;

use super::types::{Frequency, ScheduleParams, SchedulePatch};

/// Schedule errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Interval below 1.
    #[error("interval must be at least 1")]
    InvalidInterval,

    /// Day-of-week outside 0..=6.
    #[error("day of week must be between 0 and 6")]
    InvalidDayOfWeek,

    /// Day-of-month outside 1..=31.
    #[error("day of month must be between 1 and 31")]
    InvalidDayOfMonth,

    /// End before start.
    #[error("end date is before start date")]
    EndBeforeStart,

    /// Date arithmetic left the representable range.
    #[error("next run date is out of range")]
    OutOfRange,
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::OutOfRange => AppError::Internal(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

/// Stateless scheduler logic.
pub struct RecurringScheduler;

impl RecurringScheduler {
    /// Next run after `from`, using calendar months so Jan 31 + 1 month is
    /// the last day of February.
    ///
    /// Month-based steps land on `anchor_day` when given, clamped to the
    /// length of the target month, so a schedule anchored on the 31st runs
    /// Feb 28 and then Mar 31.
    ///
    /// # Errors
    ///
    /// `OutOfRange` on overflow.
    pub fn advance(
        from: DateTime<Utc>,
        frequency: Frequency,
        interval: u32,
        anchor_day: Option<u32>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let interval = interval.max(1);
        let next = match frequency {
            Frequency::Daily => from.checked_add_days(Days::new(u64::from(interval))),
            Frequency::Weekly => from.checked_add_days(Days::new(7 * u64::from(interval))),
            Frequency::Biweekly => from.checked_add_days(Days::new(14 * u64::from(interval))),
            Frequency::Monthly => from
                .checked_add_months(Months::new(interval))
                .and_then(|next| anchored(next, anchor_day)),
            Frequency::Quarterly => interval
                .checked_mul(3)
                .and_then(|m| from.checked_add_months(Months::new(m)))
                .and_then(|next| anchored(next, anchor_day)),
        };
        next.ok_or(ScheduleError::OutOfRange)
    }

    /// Active, `next_run <= now`, and not past `end_date`.
    #[must_use]
    pub fn is_due(
        is_active: bool,
        next_run: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        is_active && next_run <= now && end_date.is_none_or(|end| end >= now)
    }

    /// Validates attach input.
    ///
    /// # Errors
    ///
    /// The first invalid field.
    pub fn validate(params: &ScheduleParams) -> Result<(), ScheduleError> {
        check_anchors(Some(params.interval), params.day_of_week, params.day_of_month)?;
        if params.end_date.is_some_and(|end| end < params.start_date) {
            return Err(ScheduleError::EndBeforeStart);
        }
        Ok(())
    }

    /// Validates an update against the schedule's start date.
    ///
    /// # Errors
    ///
    /// The first invalid field.
    pub fn validate_patch(
        patch: &SchedulePatch,
        start_date: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        check_anchors(patch.interval, patch.day_of_week, patch.day_of_month)?;
        if patch.end_date.is_some_and(|end| end < start_date) {
            return Err(ScheduleError::EndBeforeStart);
        }
        Ok(())
    }
}

/// Moves `date` to `anchor_day` within its month, clamped to the month's
/// last day.
fn anchored(date: DateTime<Utc>, anchor_day: Option<u32>) -> Option<DateTime<Utc>> {
    let Some(anchor) = anchor_day else {
        return Some(date);
    };
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let last = NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()?.day();
    date.with_day(anchor.clamp(1, last))
}

fn check_anchors(
    interval: Option<u32>,
    day_of_week: Option<u32>,
    day_of_month: Option<u32>,
) -> Result<(), ScheduleError> {
    if interval == Some(0) {
        return Err(ScheduleError::InvalidInterval);
    }
    if day_of_week.is_some_and(|d| d > 6) {
        return Err(ScheduleError::InvalidDayOfWeek);
    }
    if day_of_month.is_some_and(|d| !(1..=31).contains(&d)) {
        return Err(ScheduleError::InvalidDayOfMonth);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_monthly_clamps_to_end_of_february() {
        assert_eq!(
            RecurringScheduler::advance(at(2026, 1, 31), Frequency::Monthly, 1, None).unwrap(),
            at(2026, 2, 28)
        );
        assert_eq!(
            RecurringScheduler::advance(at(2028, 1, 31), Frequency::Monthly, 1, None).unwrap(),
            at(2028, 2, 29)
        );
    }

    #[test]
    fn test_monthly_returns_to_the_anchor_day() {
        let feb = RecurringScheduler::advance(at(2026, 1, 31), Frequency::Monthly, 1, Some(31))
            .unwrap();
        assert_eq!(feb, at(2026, 2, 28));
        let mar = RecurringScheduler::advance(feb, Frequency::Monthly, 1, Some(31)).unwrap();
        assert_eq!(mar, at(2026, 3, 31));
        let apr = RecurringScheduler::advance(mar, Frequency::Monthly, 1, Some(31)).unwrap();
        assert_eq!(apr, at(2026, 4, 30));

        assert_eq!(
            RecurringScheduler::advance(at(2026, 11, 30), Frequency::Quarterly, 1, Some(30))
                .unwrap(),
            at(2027, 2, 28)
        );
        assert_eq!(
            RecurringScheduler::advance(at(2027, 2, 28), Frequency::Quarterly, 1, Some(30))
                .unwrap(),
            at(2027, 5, 30)
        );
        // Day-based steps ignore the anchor.
        assert_eq!(
            RecurringScheduler::advance(at(2026, 2, 28), Frequency::Weekly, 1, Some(31)).unwrap(),
            at(2026, 3, 7)
        );
    }

    #[test]
    fn test_day_based_frequencies() {
        let start = at(2026, 12, 28);
        assert_eq!(
            RecurringScheduler::advance(start, Frequency::Daily, 5, None).unwrap(),
            at(2027, 1, 2)
        );
        assert_eq!(
            RecurringScheduler::advance(start, Frequency::Weekly, 2, None).unwrap(),
            at(2027, 1, 11)
        );
        assert_eq!(
            RecurringScheduler::advance(start, Frequency::Biweekly, 1, None).unwrap(),
            at(2027, 1, 11)
        );
    }

    #[test]
    fn test_quarterly() {
        assert_eq!(
            RecurringScheduler::advance(at(2026, 11, 30), Frequency::Quarterly, 1, None).unwrap(),
            at(2027, 2, 28)
        );
        assert_eq!(
            RecurringScheduler::advance(at(2026, 1, 15), Frequency::Quarterly, 2, None).unwrap(),
            at(2026, 7, 15)
        );
    }

    #[test]
    fn test_is_due() {
        let now = at(2026, 10, 19);
        assert!(RecurringScheduler::is_due(true, at(2026, 10, 1), None, now));
        assert!(RecurringScheduler::is_due(true, now, Some(now), now));
        assert!(!RecurringScheduler::is_due(false, at(2026, 10, 1), None, now));
        assert!(!RecurringScheduler::is_due(true, at(2026, 10, 20), None, now));
        assert!(!RecurringScheduler::is_due(
            true,
            at(2026, 10, 1),
            Some(at(2026, 10, 18)),
            now
        ));
    }

    #[test]
    fn test_validation() {
        let mut params = ScheduleParams {
            frequency: Frequency::Weekly,
            interval: 1,
            day_of_week: Some(7),
            day_of_month: None,
            start_date: at(2026, 10, 1),
            end_date: None,
        };
        assert_eq!(
            RecurringScheduler::validate(&params),
            Err(ScheduleError::InvalidDayOfWeek)
        );
        params.day_of_week = Some(1);
        params.end_date = Some(at(2026, 9, 1));
        assert_eq!(
            RecurringScheduler::validate(&params),
            Err(ScheduleError::EndBeforeStart)
        );
        params.end_date = None;
        params.interval = 0;
        assert_eq!(
            RecurringScheduler::validate(&params),
            Err(ScheduleError::InvalidInterval)
        );
    }
}
