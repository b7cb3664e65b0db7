//! Fixed locations and labels shared by the report binaries.

/// Input file, relative to the working directory of the process.
pub const DATA_PATH: &str = "output/invalid_voucher_references.csv";

/// Column that carries the currency amount of each record.
pub const AMOUNT_COLUMN: &str = "nett_grn_amt";

pub const SAMPLE_ROWS: usize = 5;

pub const CURRENCY_MARKER: &str = "R";

pub const REPORT_TITLE: &str = "Invalid Voucher References Test";
