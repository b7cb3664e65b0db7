use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

pub mod record_set;


pub use record_set::RecordSet;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("no columns to parse from file")]
    MissingHeader,
    #[error("expected {expected} fields in line {line}, saw {found}")]
    RaggedRow { line: u64, expected: usize, found: usize },
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),
    #[error("column '{0}' overflowed")]
    Overflow(String),
}

/// Field values read as missing, in addition to the empty field.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(field: &str) -> bool {
    field.is_empty() || MISSING_MARKERS.contains(&field)
}

/// Sums amounts, failing with `Overflow` for `column` instead of panicking.
pub fn checked_sum<I>(amounts: I, column: &str) -> Result<Decimal, LoadError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount)
            .ok_or_else(|| LoadError::Overflow(column.to_string()))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Text,
}

/// A single field of a record, typed after column inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(Decimal),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => f.write_str(text),
            Cell::Empty => Ok(()),
        }
    }
}

/// Parses a field as a decimal, accepting scientific notation (`1.5e3`).
pub fn parse_number(field: &str) -> Option<Decimal> {
    Decimal::from_str(field)
        .or_else(|_| Decimal::from_scientific(field))
        .ok()
}
