use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a price table into a [`PriceSeries`](super::PriceSeries).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("cannot open market history file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed price table: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("invalid date '{value}' on line {line}")]
    InvalidDate { line: u64, value: String },

    #[error("invalid close price '{value}' on line {line}")]
    InvalidPrice { line: u64, value: String },

    #[error("non-positive close price {price} on {date}")]
    NonPositivePrice { date: NaiveDate, price: f64 },

    #[error("close price on {date} is not a finite number ({price})")]
    NonFinitePrice { date: NaiveDate, price: f64 },

    #[error("date {first} plus {days} days is out of range")]
    DateOverflow { first: NaiveDate, days: u64 },

    #[error("duplicate observation for {0}")]
    DuplicateDate(NaiveDate),

    #[error("dates must be strictly increasing ({previous} is followed by {next})")]
    Unordered { previous: NaiveDate, next: NaiveDate },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("insufficient data: need at least 2 observations, got {found}")]
    InsufficientData { found: usize },
}
