//! Date-range acquisition for history, search, and monitor queries.
//!
//! A query range is an inclusive pair of calendar days, at most
//! [`MAX_DAY_INTERVAL`] days wide, entered interactively in the local time
//! zone. The "From" step accepts the quit sentinel for a same-day default;
//! the "To" step accepts it to reuse the "From" date, and re-prompts on its
//! own when the interval falls outside the allowed range.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::{Error, Result};
use crate::input::{COMMAND_QUIT, Prompter};

/// Widest inclusive day interval a query may span.
pub const MAX_DAY_INTERVAL: i64 = 5;

/// Human-readable name of the accepted date format.
pub const DATE_FORMAT: &str = "YYYY-MM-DD";

const FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// An inclusive pair of calendar days.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateRange {
    /// First day of the range.
    pub from: Date,

    /// Last day of the range.
    pub to: Date,
}

impl DateRange {
    /// A range covering a single day.
    pub fn single(date: Date) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    /// Inclusive width in whole days: same-day counts as 1, and a `to`
    /// earlier than `from` goes non-positive.
    pub fn day_interval(&self) -> i64 {
        i64::from(self.to.to_julian_day() - self.from.to_julian_day()) + 1
    }

    /// Whether the interval falls within `[1, MAX_DAY_INTERVAL]`.
    pub fn is_valid(&self) -> bool {
        (1..=MAX_DAY_INTERVAL).contains(&self.day_interval())
    }
}

/// Parse a date in the [`DATE_FORMAT`] textual format.
pub fn parse_date(input: &str) -> Result<Date> {
    Date::parse(input.trim(), FORMAT).map_err(|_| {
        Error::validation(
            format!("dates must use the {DATE_FORMAT} format"),
            Some("date".to_string()),
        )
    })
}

/// Today's date in the local time zone, falling back to UTC when the local
/// offset cannot be determined.
pub fn today_local() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Interactively acquire a validated date range.
///
/// Semantics:
/// - quit sentinel at "From" yields `{today, today}` immediately;
/// - an unparseable "From" re-prompts the "From" step;
/// - quit sentinel at "To" yields `{from, from}`;
/// - an out-of-range interval (including `to` before `from`) reports the
///   computed interval and the valid range, then re-prompts ONLY the "To"
///   step; the captured "From" is retained.
///
/// # Errors
///
/// Propagates closed input from the underlying line source.
pub fn resolve_date_range(prompter: &mut Prompter) -> Result<DateRange> {
    println!("The inclusive interval between the From and To dates is 1 to {MAX_DAY_INTERVAL} days.");
    println!("Dates use the {DATE_FORMAT} format in the LOCAL time zone (ex. 2020-04-25).");
    println!("'{COMMAND_QUIT}' at From uses today for both; '{COMMAND_QUIT}' at To reuses the From date.");

    let from = loop {
        let input = prompter.get_line(&format!("From date ('{COMMAND_QUIT}' for default): "))?;
        if input.trim() == COMMAND_QUIT {
            return Ok(DateRange::single(today_local()));
        }
        match parse_date(&input) {
            Ok(date) => break date,
            Err(err) => println!("{err}"),
        }
    };

    loop {
        let input = prompter.get_line(&format!("To date ('{COMMAND_QUIT}' for default): "))?;
        if input.trim() == COMMAND_QUIT {
            return Ok(DateRange::single(from));
        }
        let to = match parse_date(&input) {
            Ok(date) => date,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        let range = DateRange { from, to };
        if range.is_valid() {
            return Ok(range);
        }
        println!(
            "Invalid day interval: {}. The range should be [1, {MAX_DAY_INTERVAL}].",
            range.day_interval()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedInput;
    use time::macros::date;

    fn prompter(lines: &[&str]) -> Prompter {
        Prompter::new(Box::new(ScriptedInput::new(lines.iter().copied())))
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2020-04-25").unwrap(), date!(2020 - 04 - 25));
        assert_eq!(parse_date("  2020-04-25  ").unwrap(), date!(2020 - 04 - 25));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("04-25-2020").is_err());
        assert!(parse_date("2020-02-30").is_err());
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn interval_is_inclusive() {
        let range = DateRange {
            from: date!(2020 - 04 - 25),
            to: date!(2020 - 04 - 28),
        };
        assert_eq!(range.day_interval(), 4);
        assert!(range.is_valid());

        assert_eq!(DateRange::single(date!(2020 - 04 - 25)).day_interval(), 1);
    }

    #[test]
    fn interval_crosses_month_boundaries() {
        let range = DateRange {
            from: date!(2020 - 04 - 29),
            to: date!(2020 - 05 - 02),
        };
        assert_eq!(range.day_interval(), 4);
        assert!(range.is_valid());
    }

    #[test]
    fn reversed_range_is_just_invalid() {
        let range = DateRange {
            from: date!(2020 - 04 - 28),
            to: date!(2020 - 04 - 25),
        };
        assert_eq!(range.day_interval(), -2);
        assert!(!range.is_valid());
    }

    #[test]
    fn six_day_interval_is_invalid() {
        let range = DateRange {
            from: date!(2020 - 04 - 25),
            to: date!(2020 - 04 - 30),
        };
        assert_eq!(range.day_interval(), 6);
        assert!(!range.is_valid());
    }

    #[test]
    fn quit_at_from_defaults_to_today() {
        let mut p = prompter(&["q"]);
        let range = resolve_date_range(&mut p).unwrap();
        let today = today_local();
        assert_eq!(range, DateRange::single(today));
    }

    #[test]
    fn quit_at_to_reuses_from() {
        let mut p = prompter(&["2020-04-25", "q"]);
        let range = resolve_date_range(&mut p).unwrap();
        assert_eq!(range, DateRange::single(date!(2020 - 04 - 25)));
    }

    #[test]
    fn accepts_four_day_interval() {
        let mut p = prompter(&["2020-04-25", "2020-04-28"]);
        let range = resolve_date_range(&mut p).unwrap();
        assert_eq!(range.day_interval(), 4);
    }

    #[test]
    fn rejects_six_days_and_retains_from() {
        // 2020-04-30 makes a 6-day interval; only the To step re-prompts.
        let mut p = prompter(&["2020-04-25", "2020-04-30", "2020-04-27"]);
        let range = resolve_date_range(&mut p).unwrap();
        assert_eq!(range.from, date!(2020 - 04 - 25));
        assert_eq!(range.to, date!(2020 - 04 - 27));
    }

    #[test]
    fn malformed_from_reprompts_from() {
        let mut p = prompter(&["not-a-date", "2020-04-25", "q"]);
        let range = resolve_date_range(&mut p).unwrap();
        assert_eq!(range, DateRange::single(date!(2020 - 04 - 25)));
    }

    #[test]
    fn closed_input_propagates() {
        let mut p = prompter(&["2020-04-25"]);
        assert!(resolve_date_range(&mut p).unwrap_err().is_input_closed());
    }
}
