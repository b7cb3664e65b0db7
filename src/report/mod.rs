use std::io;
use std::path::Path;

use enum_dispatch::enum_dispatch;
use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};

pub mod directives;
pub mod host;


use crate::config::{AMOUNT_COLUMN, CURRENCY_MARKER, REPORT_TITLE, SAMPLE_ROWS};
use crate::data::{LoadError, RecordSet};
use directives::{Directive, ErrorMessage, Metric, Subheading, SuccessMessage, Table, Title};

/// Writes one directive onto the display surface.
#[enum_dispatch]
pub trait Render {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

/// Builds the full list of directives for the file at `path`.
///
/// The title always comes first. A failure to load the file or to
/// aggregate the amount column produces a single error directive and
/// nothing else; the success directives are only emitted once every
/// value they show has been computed.
pub fn build_report<P: AsRef<Path>>(path: P) -> Vec<Directive> {
    let mut directives = vec![Directive::from(Title::new(REPORT_TITLE))];

    match summarize(path.as_ref()) {
        Ok((records, total)) => {
            directives.push(SuccessMessage::new(format!("Loaded {} invalid voucher records", records.len())).into());
            directives.push(Metric::new("Total Value", format_currency(total)).into());
            directives.push(Subheading::new("Sample Data").into());
            directives.push(Table::from_records(&records, SAMPLE_ROWS).into());
        },
        Err(err) => {
            warn!("failed to load report data, path={}, err={}", path.as_ref().display(), err);
            directives.push(ErrorMessage::new(format!("Error loading data: {}", err)).into());
        },
    }

    directives
}

fn summarize(path: &Path) -> Result<(RecordSet, Decimal), LoadError> {
    let records = RecordSet::load(path)?;
    let total = records.sum_column(AMOUNT_COLUMN)?;

    Ok((records, total))
}

/// Formats an amount as `R` followed by a comma grouped value with two
/// decimals, e.g. `R12,345.67`. Half cents round to even.
pub fn format_currency(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = rounded.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    format!("{}{}{}.{}", CURRENCY_MARKER, sign, group_thousands(integer), fraction)
}

fn group_thousands(integer: &str) -> String {
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}
