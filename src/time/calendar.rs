//! Calendar arithmetic in an IANA zone: resolution snapping and
//! calendar-aware durations.
//!
//! All arithmetic happens on local wall-clock fields and is converted back
//! to an instant afterwards. Ambiguous local times resolve to the earlier
//! instant, non-existent ones shift forward by the length of the gap.

use super::{Resolution, Timestamp};
use crate::error::{HorizonError, HorizonResult};
use chrono::{
    Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike,
};
use chrono_tz::Tz;
use serde::Serialize;

/// Resolves a wall-clock time in `tz` to an instant.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> Timestamp {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Inside a DST gap: apply the offset in force before the gap.
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix();
            let utc = naive - Duration::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn floor_date(date: NaiveDate, resolution: Resolution) -> NaiveDate {
    match resolution {
        Resolution::Hour | Resolution::Day => date,
        Resolution::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
        Resolution::Month => date - Duration::days(i64::from(date.day0())),
        Resolution::Year => date - Duration::days(i64::from(date.ordinal0())),
    }
}

/// Start of the `resolution` unit containing `ts`.
pub fn floor(ts: &Timestamp, resolution: Resolution) -> Timestamp {
    let tz = ts.timezone();
    let naive = ts.naive_local();

    if resolution == Resolution::Hour {
        // Keep the offset of `ts` so the second pass of a repeated hour
        // floors to itself rather than to the first pass.
        let truncated = midnight(naive.date()) + Duration::hours(i64::from(naive.hour()));
        let offset = ts.offset().fix().local_minus_utc();
        return tz.from_utc_datetime(&(truncated - Duration::seconds(i64::from(offset))));
    }

    localize(tz, midnight(floor_date(naive.date(), resolution)))
}

fn next_boundary(ts: &Timestamp, resolution: Resolution) -> Timestamp {
    let start = floor(ts, resolution);
    if resolution == Resolution::Hour {
        return start + Duration::hours(1);
    }

    let tz = ts.timezone();
    let first_day = floor_date(ts.naive_local().date(), resolution);
    let next = match resolution {
        Resolution::Hour | Resolution::Day => first_day.checked_add_days(Days::new(1)),
        Resolution::Week => first_day.checked_add_days(Days::new(7)),
        Resolution::Month => first_day.checked_add_months(Months::new(1)),
        Resolution::Year => first_day.checked_add_months(Months::new(12)),
    };

    match next {
        Some(date) => localize(tz, midnight(date)),
        None => tz.from_utc_datetime(&NaiveDateTime::MAX),
    }
}

/// Last millisecond of the `resolution` unit containing `ts`.
pub fn ceil(ts: &Timestamp, resolution: Resolution) -> Timestamp {
    next_boundary(ts, resolution) - Duration::milliseconds(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// A duration measured in calendar fields rather than elapsed time, so
/// "1 month" tracks real month lengths.
///
/// Month and year arithmetic clamps the day of month to the last valid day
/// of the target month: 31 March minus one month is 29 February in a leap
/// year. Clamped steps are not reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CalendarDuration {
    #[serde(skip_serializing_if = "is_zero")]
    pub years: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub months: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub weeks: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub days: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl CalendarDuration {
    pub const fn weeks(weeks: u32) -> Self {
        Self { years: 0, months: 0, weeks, days: 0 }
    }

    pub const fn months(months: u32) -> Self {
        Self { years: 0, months, weeks: 0, days: 0 }
    }

    pub const fn days(days: u32) -> Self {
        Self { years: 0, months: 0, weeks: 0, days }
    }

    pub fn total_months(&self) -> u32 {
        self.years * 12 + self.months
    }

    pub fn total_days(&self) -> u64 {
        u64::from(self.weeks) * 7 + u64::from(self.days)
    }

    pub fn is_weeks_only(&self) -> bool {
        self.weeks > 0 && self.total_months() == 0 && self.days == 0
    }

    /// Moves `ts` by this duration. Months are applied before days.
    pub fn apply(&self, ts: &Timestamp, direction: Direction) -> HorizonResult<Timestamp> {
        let months = Months::new(self.total_months());
        let days = Days::new(self.total_days());
        let naive = ts.naive_local();

        let moved = match direction {
            Direction::Forward => naive
                .checked_add_months(months)
                .and_then(|n| n.checked_add_days(days)),
            Direction::Backward => naive
                .checked_sub_months(months)
                .and_then(|n| n.checked_sub_days(days)),
        };

        moved
            .map(|n| localize(ts.timezone(), n))
            .ok_or_else(|| HorizonError::invalid_range("date arithmetic out of range"))
    }

    pub fn add_to(&self, ts: &Timestamp) -> HorizonResult<Timestamp> {
        self.apply(ts, Direction::Forward)
    }

    pub fn subtract_from(&self, ts: &Timestamp) -> HorizonResult<Timestamp> {
        self.apply(ts, Direction::Backward)
    }
}
