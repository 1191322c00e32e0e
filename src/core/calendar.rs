use chrono::{Months, NaiveDate};

/// Step a date back by whole calendar months
///
/// The day of month is kept where the resulting month has it, otherwise it
/// is clamped to that month's last day (2024-03-31 minus 1 month is
/// 2024-02-29). Returns `None` only when the result leaves chrono's
/// supported date range.
#[inline]
pub fn months_before(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(months))
}

/// Step a date forward by whole calendar months, clamping like [`months_before`]
#[inline]
pub fn months_after(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
