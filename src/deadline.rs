//! Rescission-deadline arithmetic.
//!
//! A borrower's right-of-rescission window closes three business days after
//! signing. For this product a *business day* is any calendar day that is
//! neither a **Sunday** nor a listed federal holiday — Saturdays count,
//! matching the courier pickup schedule loan packages actually ship on.
//! Do not "fix" the Saturday asymmetry; it is the documented behaviour.
//!
//! The holiday table is an injected [`HolidayCalendar`] value rather than a
//! module global, so tests (and future years) can supply their own calendar.
//! Everything here is a pure function of the input text and the calendar:
//! no I/O, no clock reads.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// The one way this module can fail: the signing date didn't parse.
///
/// Returned as a value from [`RescissionCalculator::compute`]; the
/// calculator never panics on user input and has no other error kinds
/// (the holiday calendar is static data and cannot fail).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DeadlineError {
    #[error("Invalid date format. Use MM/DD/YYYY")]
    InvalidFormat,
}

/// An immutable set of dates excluded from the business-day count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Build a calendar from an explicit list of dates.
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// An empty calendar — every non-Sunday counts.
    pub fn empty() -> Self {
        Self {
            dates: BTreeSet::new(),
        }
    }

    /// The US federal holidays observed in 2025–2026.
    pub fn federal_2025_2026() -> Self {
        // (year, month, day) triples; from_ymd_opt only fails on nonsense
        // input, and these are fixed known-good dates.
        const OBSERVED: [(i32, u32, u32); 13] = [
            (2025, 1, 1),   // New Year's Day
            (2025, 1, 20),  // Martin Luther King Jr. Day
            (2025, 2, 17),  // Washington's Birthday
            (2025, 5, 26),  // Memorial Day
            (2025, 6, 19),  // Juneteenth
            (2025, 7, 4),   // Independence Day
            (2025, 9, 1),   // Labor Day
            (2025, 10, 13), // Columbus Day
            (2025, 11, 11), // Veterans Day
            (2025, 11, 27), // Thanksgiving
            (2025, 12, 25), // Christmas
            (2026, 1, 1),   // New Year's Day
            (2026, 1, 19),  // Martin Luther King Jr. Day
        ];
        Self::from_dates(
            OBSERVED
                .iter()
                .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        )
    }

    /// Whether `date` is listed as a holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Number of listed dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::federal_2025_2026()
    }
}

/// Computes the rescission deadline from a signing date.
///
/// # Example
/// ```rust
/// use doccheck::RescissionCalculator;
///
/// let calc = RescissionCalculator::default();
/// assert_eq!(calc.compute("01/20/2026").unwrap(), "01/23/2026");
/// assert!(calc.compute("13/40/2025").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RescissionCalculator {
    holidays: HolidayCalendar,
    waiting_days: u32,
}

impl Default for RescissionCalculator {
    fn default() -> Self {
        Self::new(HolidayCalendar::default())
    }
}

impl RescissionCalculator {
    /// A calculator counting the standard three business days against the
    /// given holiday calendar.
    pub fn new(holidays: HolidayCalendar) -> Self {
        Self {
            holidays,
            waiting_days: 3,
        }
    }

    /// Override the number of business days counted (three is the legal
    /// default; some lenders add a courtesy day).
    pub fn with_waiting_days(mut self, days: u32) -> Self {
        self.waiting_days = days.max(1);
        self
    }

    /// Parse a signing date and return the formatted deadline, `MM/DD/YYYY`.
    ///
    /// Accepts `MM/DD/YYYY` with `-` tolerated as the separator. Exactly one
    /// of deadline / error is ever produced; parse failures come back as
    /// [`DeadlineError::InvalidFormat`], never as a panic.
    pub fn compute(&self, sign_date_text: &str) -> Result<String, DeadlineError> {
        let sign_date = parse_sign_date(sign_date_text)?;
        Ok(self.deadline_after(sign_date).format("%m/%d/%Y").to_string())
    }

    /// Walk forward from `sign_date`, one calendar day at a time, until
    /// exactly `waiting_days` business days have been counted; the last
    /// counted day is the deadline.
    pub fn deadline_after(&self, sign_date: NaiveDate) -> NaiveDate {
        let mut current = sign_date;
        let mut counted = 0;
        while counted < self.waiting_days {
            current = current.succ_opt().expect("date overflow");
            if self.is_business_day(current) {
                counted += 1;
            }
        }
        current
    }

    /// A day counts unless it is a Sunday or a listed holiday.
    /// Saturday is deliberately NOT excluded.
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        date.weekday() != Weekday::Sun && !self.holidays.contains(date)
    }
}

/// Parse signing-date text, normalising `-` to `/` first.
///
/// The underlying parser tolerates 1–2 digit month/day fields; the
/// documented format is `MM/DD/YYYY`.
pub fn parse_sign_date(text: &str) -> Result<NaiveDate, DeadlineError> {
    let normalized = text.trim().replace('-', "/");
    NaiveDate::parse_from_str(&normalized, "%m/%d/%Y").map_err(|_| DeadlineError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn three_plain_weekdays() {
        // Tue 01/20/2026 → Wed 21, Thu 22, Fri 23 count. MLK Day (01/19)
        // falls before the window and changes nothing.
        let calc = RescissionCalculator::default();
        assert_eq!(calc.compute("01/20/2026").unwrap(), "01/23/2026");
    }

    #[test]
    fn dash_separator_accepted() {
        let calc = RescissionCalculator::default();
        assert_eq!(calc.compute("01-20-2026").unwrap(), "01/23/2026");
    }

    #[test]
    fn saturday_counts_sunday_does_not() {
        // Fri 01/02/2026 → Sat 3 (counts), Sun 4 (skipped), Mon 5, Tue 6.
        let calc = RescissionCalculator::default();
        assert_eq!(calc.compute("01/02/2026").unwrap(), "01/06/2026");
    }

    #[test]
    fn holiday_skipped() {
        // Wed 11/26/2025 → Thanksgiving 11/27 skipped, Fri 28 + Sat 29
        // count, Sun 30 skipped, Mon 12/01 is the third day.
        let calc = RescissionCalculator::default();
        assert_eq!(calc.compute("11/26/2025").unwrap(), "12/01/2025");
    }

    #[test]
    fn deadline_strictly_after_input_with_exactly_three_counted_days() {
        let calc = RescissionCalculator::default();
        // Sweep a few months of start dates; the counting invariant must
        // hold everywhere, not just on hand-picked examples.
        let mut start = date(2025, 1, 1);
        let end = date(2025, 4, 1);
        while start < end {
            let deadline = calc.deadline_after(start);
            assert!(deadline > start);
            let mut qualifying = 0;
            let mut d = start;
            while d < deadline {
                d = d.succ_opt().unwrap();
                if calc.is_business_day(d) {
                    qualifying += 1;
                }
            }
            assert_eq!(qualifying, 3, "start {start} deadline {deadline}");
            // The deadline itself must be a counted day.
            assert!(calc.is_business_day(deadline));
            start = start.succ_opt().unwrap();
        }
    }

    #[test]
    fn nonsense_month_and_day_rejected() {
        let calc = RescissionCalculator::default();
        assert_eq!(calc.compute("13/40/2025"), Err(DeadlineError::InvalidFormat));
    }

    #[test]
    fn wrong_field_order_rejected() {
        let calc = RescissionCalculator::default();
        assert_eq!(calc.compute("2025/01/01"), Err(DeadlineError::InvalidFormat));
    }

    #[test]
    fn garbage_rejected() {
        let calc = RescissionCalculator::default();
        assert!(calc.compute("next Tuesday").is_err());
        assert!(calc.compute("").is_err());
    }

    #[test]
    fn alternate_calendar_injected() {
        // With an empty calendar, Thanksgiving week is just ordinary days.
        let calc = RescissionCalculator::new(HolidayCalendar::empty());
        // Wed 11/26/2025 → Thu 27, Fri 28, Sat 29.
        assert_eq!(calc.compute("11/26/2025").unwrap(), "11/29/2025");
    }

    #[test]
    fn federal_table_contents() {
        let cal = HolidayCalendar::federal_2025_2026();
        assert_eq!(cal.len(), 13);
        assert!(cal.contains(date(2025, 7, 4)));
        assert!(cal.contains(date(2026, 1, 19)));
        assert!(!cal.contains(date(2025, 7, 5)));
    }

    #[test]
    fn custom_waiting_days() {
        let calc = RescissionCalculator::new(HolidayCalendar::empty()).with_waiting_days(1);
        // Sat 01/03/2026 → Sun skipped → Mon 01/05.
        assert_eq!(calc.compute("01/03/2026").unwrap(), "01/05/2026");
    }
}
