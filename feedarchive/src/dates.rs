//! Calendar date selection for archive downloads.
//!
//! A download run covers either a single day, an explicit inclusive span, or
//! the trailing N days. All validation happens here, before any network
//! activity.

use chrono::{Days, Local, NaiveDate};

use crate::error::{Error, Result};

/// Date format accepted on the command line and in archive URLs.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Which calendar dates a download run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSpec {
    /// Exactly one day.
    Single(NaiveDate),
    /// Every day from `start` to `end`, inclusive, ascending.
    Span { start: NaiveDate, end: NaiveDate },
    /// Today and the N days before it, newest first.
    PastDays(u64),
}

impl DateSpec {
    /// Expand into the ordered list of dates to process.
    ///
    /// Fails with [`Error::InvalidRange`] if any requested date lies in the
    /// future or a span's start is after its end.
    pub fn expand(&self, today: NaiveDate) -> Result<Vec<NaiveDate>> {
        match *self {
            DateSpec::Single(date) => {
                if date > today {
                    return Err(Error::InvalidRange(format!(
                        "{} is in the future",
                        date.format(DATE_FORMAT)
                    )));
                }
                Ok(vec![date])
            }
            DateSpec::Span { start, end } => {
                if start > today || end > today {
                    return Err(Error::InvalidRange(
                        "start date and end date must not be after today".into(),
                    ));
                }
                if start > end {
                    return Err(Error::InvalidRange(
                        "start date must not be after end date".into(),
                    ));
                }

                let mut dates = Vec::new();
                let mut date = start;
                while date <= end {
                    dates.push(date);
                    date = date.succ_opt().ok_or_else(|| {
                        Error::InvalidRange("date range exceeds the calendar".into())
                    })?;
                }
                Ok(dates)
            }
            DateSpec::PastDays(n) => {
                let mut dates = Vec::with_capacity(n as usize + 1);
                for back in 0..=n {
                    let Some(date) = today.checked_sub_days(Days::new(back)) else {
                        break;
                    };
                    dates.push(date);
                }
                Ok(dates)
            }
        }
    }

    /// Expand against the current local date.
    pub fn expand_from_today(&self) -> Result<Vec<NaiveDate>> {
        self.expand(Local::now().date_naive())
    }
}

/// Parse a `YYYY/MM/DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::InvalidRange(format!("bad date {s:?}: {e}")))
}

/// Parse a `YYYY/MM/DD-YYYY/MM/DD` range string into a span.
pub fn parse_range(s: &str) -> Result<DateSpec> {
    let (start, end) = s.split_once('-').ok_or_else(|| {
        Error::InvalidRange(format!(
            "bad range {s:?}: expected YYYY/MM/DD-YYYY/MM/DD"
        ))
    })?;
    Ok(DateSpec::Span {
        start: parse_date(start)?,
        end: parse_date(end)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2024, 3, 15)
    }

    #[test]
    fn test_single_date() {
        let dates = DateSpec::Single(day(2024, 3, 10)).expand(today()).unwrap();
        assert_eq!(dates, vec![day(2024, 3, 10)]);
    }

    #[test]
    fn test_single_date_today_is_allowed() {
        let dates = DateSpec::Single(today()).expand(today()).unwrap();
        assert_eq!(dates, vec![today()]);
    }

    #[test]
    fn test_single_date_in_future_rejected() {
        let result = DateSpec::Single(day(2024, 3, 16)).expand(today());
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_span_ascending_and_gap_free() {
        let dates = DateSpec::Span {
            start: day(2024, 2, 27),
            end: day(2024, 3, 2),
        }
        .expand(today())
        .unwrap();

        // Crosses the leap-year February boundary without gaps.
        assert_eq!(
            dates,
            vec![
                day(2024, 2, 27),
                day(2024, 2, 28),
                day(2024, 2, 29),
                day(2024, 3, 1),
                day(2024, 3, 2),
            ]
        );
    }

    #[test]
    fn test_span_single_day() {
        let dates = DateSpec::Span {
            start: day(2024, 3, 1),
            end: day(2024, 3, 1),
        }
        .expand(today())
        .unwrap();
        assert_eq!(dates, vec![day(2024, 3, 1)]);
    }

    #[test]
    fn test_span_start_after_end_rejected() {
        let result = DateSpec::Span {
            start: day(2024, 3, 5),
            end: day(2024, 3, 1),
        }
        .expand(today());
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_span_beyond_today_rejected() {
        let result = DateSpec::Span {
            start: day(2024, 3, 10),
            end: day(2024, 3, 20),
        }
        .expand(today());
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_past_days_descending_from_today() {
        let dates = DateSpec::PastDays(3).expand(today()).unwrap();
        assert_eq!(
            dates,
            vec![
                day(2024, 3, 15),
                day(2024, 3, 14),
                day(2024, 3, 13),
                day(2024, 3, 12),
            ]
        );
    }

    #[test]
    fn test_past_zero_days_is_just_today() {
        let dates = DateSpec::PastDays(0).expand(today()).unwrap();
        assert_eq!(dates, vec![today()]);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024/03/15").unwrap(), day(2024, 3, 15));
        assert!(parse_date("03/15/2024").is_err());
        assert!(parse_date("2024-03-15").is_err());
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_parse_range() {
        let spec = parse_range("2024/03/01-2024/03/05").unwrap();
        assert_eq!(
            spec,
            DateSpec::Span {
                start: day(2024, 3, 1),
                end: day(2024, 3, 5),
            }
        );
        assert!(parse_range("2024/03/01").is_err());
    }
}
