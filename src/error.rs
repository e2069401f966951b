use std::path::PathBuf;
use thiserror::Error;

/// Failures a report invocation can end with. Every variant is terminal.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing {name}. {hint}")]
    MissingRequiredParameter { name: &'static str, hint: String },

    #[error("wrong date given: '{raw}' - expected {expected}")]
    InvalidDate { raw: String, expected: &'static str },

    #[error("{}", describe_lookup(.entity, .pattern, .matches))]
    AmbiguousOrNotFound {
        entity: &'static str,
        pattern: String,
        matches: usize,
    },

    #[error("currency exchange rate(s) missing: {} - add them first", .pairs.join(", "))]
    MissingExchangeRate { pairs: Vec<String> },

    #[error("data file not found: {} (run `moneta init` first)", .0.display())]
    DataFileMissing(PathBuf),

    #[error("data access failure: {0}")]
    DataAccess(#[from] rusqlite::Error),
}

fn describe_lookup(entity: &str, pattern: &str, matches: &usize) -> String {
    if *matches == 0 {
        format!("no open {entity} matches '{pattern}'")
    } else {
        format!("{entity} name '{pattern}' is ambiguous ({matches} open matches)")
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
