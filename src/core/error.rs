//! Error kinds raised by the simulation core

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid price {price} at period {period}")]
    InvalidPrice { period: usize, price: f64 },

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Invalid contribution amount: {0}")]
    InvalidContribution(f64),

    #[error("Invalid allocation weight {0}: weights must lie in [0, 1] and sum to 1.0")]
    InvalidWeight(f64),

    #[error("Series length mismatch: expected {expected} periods, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Series are not aligned at index {index}")]
    MisalignedSeries { index: usize },

    #[error("Timestamps are not strictly increasing at index {index}")]
    UnorderedTimestamps { index: usize },

    #[error("No observation on or before {date}")]
    MissingObservation { date: NaiveDate },

    #[error("Price at index {index} is quoted in the wrong currency")]
    CurrencyMismatch { index: usize },

    #[error("Date range contains no periods")]
    EmptyRange,
}

pub type Result<T> = std::result::Result<T, SimulationError>;
