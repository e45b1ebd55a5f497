//! Temporal range extraction from free text.
//!
//! Patterns are tried in a fixed order and the first that yields a window
//! wins:
//! 1. `between|from <date> and|to <date>`
//! 2. `since|after <date>` (ends today)
//! 3. `<month name> <year>`
//! 4. `<year>-<month>` (this also fires inside a full ISO date)
//! 5. `last N day(s)|week(s)|month(s)`, with weeks as 7 days and months as
//!    30 days rather than calendar months
//! 6. `today`, `yesterday`, `last month` (previous calendar month)
//!
//! The reference date is always passed in, never read from the clock.

use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use trade_core::{DatasetBounds, DateWindow};

static BETWEEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(between|from)\s*(\d{4}-\d{2}-\d{2})\s*(and|to)\s*(\d{4}-\d{2}-\d{2})")
        .expect("hardcoded between pattern is valid")
});
static SINCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(since|after)\s*(\d{4}-\d{2}-\d{2})").expect("hardcoded since pattern is valid")
});
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:in\s+)?([a-z]+)\s+(\d{4})").expect("hardcoded month-year pattern is valid")
});
static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:in\s*)?(\d{4})-(\d{2})").expect("hardcoded year-month pattern is valid")
});
static LAST_N: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"last\s+(\d{1,3})\s*(day|days|week|weeks|month|months)")
        .expect("hardcoded last-n pattern is valid")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolves a query's date window against a fixed reference date and the
/// dataset's date span
#[derive(Debug, Clone, Copy)]
pub struct DateRangeParser {
    today: NaiveDate,
    bounds: DatasetBounds,
}

impl DateRangeParser {
    pub fn new(today: NaiveDate, bounds: DatasetBounds) -> Self {
        Self { today, bounds }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Window for `text`, clamped to the dataset span. Unbounded when no
    /// pattern matches.
    pub fn parse(&self, text: &str) -> DateWindow {
        self.bounds.clamp(parse_raw_window(text, self.today))
    }
}

/// Window for `text` before clamping
pub fn parse_raw_window(text: &str, today: NaiveDate) -> DateWindow {
    let t = text.trim().to_lowercase();

    explicit_range(&t)
        .or_else(|| since(&t, today))
        .or_else(|| month_name_year(&t))
        .or_else(|| year_dash_month(&t))
        .or_else(|| last_n_units(&t, today))
        .or_else(|| relative_literal(&t, today))
        .unwrap_or_default()
}

fn iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn explicit_range(t: &str) -> Option<DateWindow> {
    let caps = BETWEEN.captures(t)?;
    let start = iso_date(&caps[2])?;
    let end = iso_date(&caps[4])?;
    Some(DateWindow::between(start, end))
}

fn since(t: &str, today: NaiveDate) -> Option<DateWindow> {
    let caps = SINCE.captures(t)?;
    Some(DateWindow::between(iso_date(&caps[2])?, today))
}

/// Only the leftmost `<word> <year>` pair is considered
fn month_name_year(t: &str) -> Option<DateWindow> {
    let caps = MONTH_YEAR.captures(t)?;
    let month = MONTHS.iter().position(|m| *m == &caps[1])? as u32 + 1;
    let year = caps[2].parse::<i32>().ok()?;
    calendar_month(year, month)
}

fn year_dash_month(t: &str) -> Option<DateWindow> {
    let caps = YEAR_MONTH.captures(t)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    calendar_month(year, month)
}

fn last_n_units(t: &str, today: NaiveDate) -> Option<DateWindow> {
    let caps = LAST_N.captures(t)?;
    let n = caps[1].parse::<u64>().ok()?;
    let unit = &caps[2];

    let days = if unit.starts_with("day") {
        n
    } else if unit.starts_with("week") {
        7 * n
    } else {
        30 * n
    };

    let start = today.checked_sub_days(Days::new(days))?;
    Some(DateWindow::between(start, today))
}

fn relative_literal(t: &str, today: NaiveDate) -> Option<DateWindow> {
    if t.contains("today") {
        return Some(DateWindow::between(today, today));
    }
    if t.contains("yesterday") {
        let y = today.pred_opt()?;
        return Some(DateWindow::between(y, y));
    }
    if t.contains("last month") {
        let prev_month_end = today.with_day(1)?.pred_opt()?;
        return Some(DateWindow::between(prev_month_end.with_day(1)?, prev_month_end));
    }
    None
}

/// First to last day of a calendar month. The last day is found by jumping
/// from the 28th into the next month and stepping back from its first day.
fn calendar_month(year: i32, month: u32) -> Option<DateWindow> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = NaiveDate::from_ymd_opt(year, month, 28)?
        .checked_add_days(Days::new(4))?
        .with_day(1)?
        .pred_opt()?;
    Some(DateWindow::between(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2025, 8, 14)
    }

    fn window(s: NaiveDate, e: NaiveDate) -> DateWindow {
        DateWindow::between(s, e)
    }

    #[test]
    fn test_last_two_weeks() {
        assert_eq!(
            parse_raw_window("last 2 weeks", today()),
            window(d(2025, 7, 31), today())
        );
    }

    #[test]
    fn test_last_n_days_and_months() {
        assert_eq!(
            parse_raw_window("trades in the last 3 days", today()),
            window(d(2025, 8, 11), today())
        );
        // 30-day approximation, not calendar months
        assert_eq!(
            parse_raw_window("last 1 month", today()),
            window(d(2025, 7, 15), today())
        );
        assert_eq!(
            parse_raw_window("last 2 months", today()),
            window(d(2025, 6, 15), today())
        );
    }

    #[test]
    fn test_explicit_range() {
        assert_eq!(
            parse_raw_window("Trades between 2024-03-01 and 2024-04-15", today()),
            window(d(2024, 3, 1), d(2024, 4, 15))
        );
        assert_eq!(
            parse_raw_window("from 2024-03-01 to 2024-03-02", today()),
            window(d(2024, 3, 1), d(2024, 3, 2))
        );
    }

    #[test]
    fn test_since_runs_to_today() {
        assert_eq!(
            parse_raw_window("what changed since 2025-01-01?", today()),
            window(d(2025, 1, 1), today())
        );
    }

    #[test]
    fn test_month_name_year() {
        assert_eq!(
            parse_raw_window("What did I trade in March 2025", today()),
            window(d(2025, 3, 1), d(2025, 3, 31))
        );
        assert_eq!(
            parse_raw_window("february 2024", today()),
            window(d(2024, 2, 1), d(2024, 2, 29))
        );
    }

    #[test]
    fn test_month_name_year_uses_leftmost_pair() {
        // "btc 2024" is found first and is not a month
        assert!(parse_raw_window("BTC 2024 trades from april 2024", today()).is_unbounded());
        assert_eq!(
            parse_raw_window("april 2024 BTC 2024 trades", today()),
            window(d(2024, 4, 1), d(2024, 4, 30))
        );
    }

    #[test]
    fn test_year_dash_month() {
        assert_eq!(
            parse_raw_window("in 2023-02", today()),
            window(d(2023, 2, 1), d(2023, 2, 28))
        );
        assert_eq!(
            parse_raw_window("2024-12", today()),
            window(d(2024, 12, 1), d(2024, 12, 31))
        );
    }

    #[test]
    fn test_full_iso_date_resolves_to_its_month() {
        assert_eq!(
            parse_raw_window("Why did you buy DOGE on 2024-10-09?", today()),
            window(d(2024, 10, 1), d(2024, 10, 31))
        );
    }

    #[test]
    fn test_invalid_month_falls_through() {
        assert!(parse_raw_window("ref 2024-13", today()).is_unbounded());
    }

    #[test]
    fn test_relative_literals() {
        assert_eq!(parse_raw_window("Today", today()), window(today(), today()));
        assert_eq!(
            parse_raw_window("what about yesterday", today()),
            window(d(2025, 8, 13), d(2025, 8, 13))
        );
        assert_eq!(
            parse_raw_window("lessons from last month", today()),
            window(d(2025, 7, 1), d(2025, 7, 31))
        );
    }

    #[test]
    fn test_last_month_across_year_boundary() {
        assert_eq!(
            parse_raw_window("last month", d(2025, 1, 9)),
            window(d(2024, 12, 1), d(2024, 12, 31))
        );
    }

    #[test]
    fn test_no_match_is_unbounded() {
        assert!(parse_raw_window("Show recent BTC buys", today()).is_unbounded());
        assert!(parse_raw_window("", today()).is_unbounded());
    }

    #[test]
    fn test_parser_clamps_to_dataset() {
        let parser = DateRangeParser::new(today(), DatasetBounds::new(d(2024, 1, 10), d(2025, 8, 1)));

        assert_eq!(
            parser.parse("last 2 weeks"),
            window(d(2025, 7, 31), d(2025, 8, 1))
        );
        assert_eq!(
            parser.parse("since 2020-05-05"),
            window(d(2024, 1, 10), d(2025, 8, 1))
        );
        assert_eq!(
            parser.parse("between 2023-01-01 and 2030-01-01"),
            window(d(2024, 1, 10), d(2025, 8, 1))
        );
    }

    #[test]
    fn test_clamped_windows_stay_inside_bounds() {
        let bounds = DatasetBounds::new(d(2024, 1, 10), d(2025, 8, 1));
        let parser = DateRangeParser::new(today(), bounds);
        let queries = [
            "today",
            "yesterday",
            "last month",
            "last 999 days",
            "in january 2010",
            "2031-06",
            "since 1999-12-31",
            "between 2024-05-01 and 2024-06-01",
        ];

        for q in queries {
            let w = parser.parse(q);
            if let Some(s) = w.start {
                assert!(s >= bounds.min, "{}: start {} before min", q, s);
            }
            if let Some(e) = w.end {
                assert!(e <= bounds.max, "{}: end {} after max", q, e);
            }
        }
    }
}
