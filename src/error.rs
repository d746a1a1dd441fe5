use thiserror::Error;

use crate::slots::SlotOverflowError;

/// Everything that can go wrong while reading backups, reconciling hours or
/// producing the submission workbook.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("line {line}: hours value {value:?} for {member:?} is not a finite number")]
    Parse {
        line: u64,
        member: String,
        value: String,
    },

    #[error("line {line}: expected at least {expected} columns, found {found}")]
    MalformedRow {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error(transparent)]
    SlotOverflow(#[from] SlotOverflowError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("template: {0}")]
    Template(#[from] calamine::XlsxError),

    #[error("chart: {0}")]
    Chart(String),

    #[error("config: {0}")]
    Config(String),

    #[error("not a Google Sheets url: {0}")]
    InvalidSheetUrl(String),

    #[error("no member totals to chart")]
    NothingToChart,
}

pub type Result<T> = std::result::Result<T, TrackerError>;
