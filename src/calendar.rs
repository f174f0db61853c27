//! Monday-start week helpers shared by the weekly aggregations

use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the week containing `date`. Sunday belongs to the preceding Monday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
  let days_from_monday = date.weekday().num_days_from_monday();
  date - Duration::days(days_from_monday as i64)
}

/// Sunday of the week containing `date`
pub fn week_end(date: NaiveDate) -> NaiveDate {
  week_start(date) + Duration::days(6)
}

/// Whole weeks between two dates, regardless of order
pub fn weeks_between(a: NaiveDate, b: NaiveDate) -> i64 {
  (b - a).num_days().abs() / 7
}
