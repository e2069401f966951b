use crate::error::{ReportError, ReportResult};
use chrono::{Datelike, NaiveDate};

/// A date argument as typed by the user, classified by its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Year(i32),
    Month(i32, u32),
    Full(NaiveDate),
}

/// Parses `YYYY-MM-DD`, `YYYY-MM` or `YYYY`. Anything else is `None`.
pub fn parse_date_spec(raw: &str) -> Option<DateSpec> {
    if !raw.is_ascii() {
        return None;
    }
    let b = raw.as_bytes();
    match b.len() {
        10 if b[4] == b'-' && b[7] == b'-' => {
            let year = digits(&raw[0..4])?;
            let month = digits(&raw[5..7])?;
            let day = digits(&raw[8..10])?;
            NaiveDate::from_ymd_opt(year as i32, month, day).map(DateSpec::Full)
        }
        7 if b[4] == b'-' => {
            let year = digits(&raw[0..4])?;
            let month = digits(&raw[5..7])?;
            (1..=12)
                .contains(&month)
                .then_some(DateSpec::Month(year as i32, month))
        }
        4 => digits(raw).map(|y| DateSpec::Year(y as i32)),
        _ => None,
    }
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Which date granularities a report understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepts {
    FullOnly,
    MonthOrYear,
    Any,
}

impl Accepts {
    fn allows(self, spec: DateSpec) -> bool {
        match (self, spec) {
            (Self::Any, _) => true,
            (Self::FullOnly, DateSpec::Full(_)) => true,
            (Self::MonthOrYear, DateSpec::Month(..) | DateSpec::Year(_)) => true,
            _ => false,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::FullOnly => "YYYY-MM-DD",
            Self::MonthOrYear => "YYYY-MM or YYYY",
            Self::Any => "YYYY-MM-DD, YYYY-MM or YYYY",
        }
    }
}

/// Inclusive selection over (year, month, day) records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Everything on or before the date.
    UpTo(NaiveDate),
    Month(i32, u32),
    Year(i32),
}

impl DateWindow {
    pub fn from_spec(spec: DateSpec) -> Self {
        match spec {
            DateSpec::Full(d) => Self::UpTo(d),
            DateSpec::Month(y, m) => Self::Month(y, m),
            DateSpec::Year(y) => Self::Year(y),
        }
    }

    pub fn current_month(today: NaiveDate) -> Self {
        Self::Month(today.year(), today.month())
    }

    pub fn contains(&self, year: i32, month: u32, day: u32) -> bool {
        match *self {
            Self::UpTo(d) => (year, month, day) <= (d.year(), d.month(), d.day()),
            Self::Month(y, m) => year == y && month == m,
            Self::Year(y) => year == y,
        }
    }

    /// Renders the window as a SQL predicate over `<alias>.year/month/day`.
    ///
    /// Placeholders are anonymous (`?`); the returned integers bind in order.
    pub fn sql_predicate(&self, alias: &str) -> (String, Vec<i64>) {
        let (y, m, d) = (
            format!("{alias}.year"),
            format!("{alias}.month"),
            format!("{alias}.day"),
        );
        match *self {
            Self::UpTo(date) => {
                let (yy, mm, dd) = (
                    i64::from(date.year()),
                    i64::from(date.month()),
                    i64::from(date.day()),
                );
                (
                    format!(
                        "({y} < ? OR ({y} = ? AND {m} < ?) OR ({y} = ? AND {m} = ? AND {d} <= ?))"
                    ),
                    vec![yy, yy, mm, yy, mm, dd],
                )
            }
            Self::Month(year, month) => (
                format!("({y} = ? AND {m} = ?)"),
                vec![i64::from(year), i64::from(month)],
            ),
            Self::Year(year) => (format!("{y} = ?"), vec![i64::from(year)]),
        }
    }

    /// Phrase used in report titles, e.g. `up to: 2024-01-31` or `during year 2024`.
    pub fn phrase(&self) -> String {
        match *self {
            Self::UpTo(d) => format!("up to: {}", d.format("%Y-%m-%d")),
            Self::Month(y, m) => format!("during month {y:04}-{m:02}"),
            Self::Year(y) => format!("during year {y}"),
        }
    }
}

/// Resolves the `--date` argument of a report into a window.
///
/// An absent date yields `default`; a present one must parse and match `accepts`.
pub fn resolve_window(
    raw: Option<&str>,
    accepts: Accepts,
    default: DateWindow,
) -> ReportResult<DateWindow> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match parse_date_spec(raw) {
        Some(spec) if accepts.allows(spec) => Ok(DateWindow::from_spec(spec)),
        _ => Err(ReportError::InvalidDate {
            raw: raw.to_string(),
            expected: accepts.expected(),
        }),
    }
}

/// Parses a full `YYYY-MM-DD` date, used when adding transactions.
pub fn parse_full_date(raw: &str) -> ReportResult<NaiveDate> {
    match parse_date_spec(raw) {
        Some(DateSpec::Full(d)) => Ok(d),
        _ => Err(ReportError::InvalidDate {
            raw: raw.to_string(),
            expected: Accepts::FullOnly.expected(),
        }),
    }
}

/// Parses a `YYYY-MM` month, used when adding budgets.
pub fn parse_month(raw: &str) -> ReportResult<(i32, u32)> {
    match parse_date_spec(raw) {
        Some(DateSpec::Month(y, m)) => Ok((y, m)),
        _ => Err(ReportError::InvalidDate {
            raw: raw.to_string(),
            expected: "YYYY-MM",
        }),
    }
}
