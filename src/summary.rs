//! Breakdown of the invalid voucher file by reason, voucher prefix and
//! supplier.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::Path;

use getset::Getters;
use log::debug;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};

use crate::config::{AMOUNT_COLUMN, SAMPLE_ROWS};
use crate::data::{checked_sum, is_missing, parse_number, LoadError};
use crate::report::format_currency;

const TOP_SUPPLIERS: usize = 5;

const REQUIRED_COLUMNS: [&str; 6] = [
    "grn_no",
    "voucher",
    "supplier_name",
    AMOUNT_COLUMN,
    "invalid_reason",
    "voucher_prefix",
];

/// Missing-value markers (`NA`, `null`, ...) deserialize as `None`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvalidVoucherRecord {
    #[serde(deserialize_with = "optional_text")]
    pub grn_no: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub voucher: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub supplier_name: Option<String>,
    #[serde(rename = "nett_grn_amt", deserialize_with = "optional_amount")]
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "optional_text")]
    pub invalid_reason: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub voucher_prefix: Option<String>,
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<String>::deserialize(deserializer)?;
    Ok(field.filter(|field| !is_missing(field)))
}

fn optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match optional_text(deserializer)? {
        Some(field) => parse_number(&field)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid amount '{}'", field))),
        None => Ok(None),
    }
}

/// `count` is the number of rows in the group with a `grn_no`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Summary {
    total_records: usize,
    total_value: Decimal,
    unique_vouchers: usize,
    average_value: Option<Decimal>,
    by_reason: Vec<Group>,
    by_prefix: Vec<Group>,
    top_suppliers: Vec<(String, Decimal)>,
    sample: Vec<InvalidVoucherRecord>,
}

pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<InvalidVoucherRecord>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    read_records(file)
}

pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<InvalidVoucherRecord>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }
    // Absent columns would otherwise deserialize as `None`.
    if let Some(column) = REQUIRED_COLUMNS.iter().find(|column| !headers.iter().any(|h| h == **column)) {
        return Err(LoadError::MissingColumn(column.to_string()));
    }

    let mut records = Vec::new();
    for record in csv_reader.deserialize::<InvalidVoucherRecord>() {
        records.push(record?);
    }
    debug!("read invalid voucher records, rows={}", records.len());

    Ok(records)
}

impl Summary {
    pub fn from_records(records: &[InvalidVoucherRecord]) -> Result<Summary, LoadError> {
        let amounts: Vec<Decimal> = records.iter().filter_map(|record| record.amount).collect();
        let total_value = checked_sum(amounts.iter().copied(), AMOUNT_COLUMN)?;
        let average_value = if amounts.is_empty() {
            None
        } else {
            Some(total_value / Decimal::from(amounts.len()))
        };

        let unique_vouchers = records
            .iter()
            .filter_map(|record| record.voucher.as_deref())
            .collect::<HashSet<_>>()
            .len();

        Ok(Summary {
            total_records: records.len(),
            total_value,
            unique_vouchers,
            average_value,
            by_reason: group_by(records, |record| record.invalid_reason.as_deref())?,
            by_prefix: group_by(records, |record| record.voucher_prefix.as_deref())?,
            top_suppliers: top_suppliers(records, TOP_SUPPLIERS)?,
            sample: records.iter().take(SAMPLE_ROWS).cloned().collect(),
        })
    }

    pub fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "=== INVALID VOUCHER REFERENCES SUMMARY ===")?;
        writeln!(out, "Total Records: {}", self.total_records)?;
        writeln!(out, "Total Value: {}", format_currency(self.total_value))?;
        writeln!(out, "Unique Vouchers: {}", self.unique_vouchers)?;
        match self.average_value {
            Some(average) => writeln!(out, "Average Value: {}", format_currency(average))?,
            None => writeln!(out, "Average Value: n/a")?,
        }

        writeln!(out, "\n=== BY REASON ===")?;
        write_groups(out, &self.by_reason)?;

        writeln!(out, "\n=== BY PREFIX ===")?;
        write_groups(out, &self.by_prefix)?;

        writeln!(out, "\n=== TOP {} SUPPLIERS BY INVALID VALUE ===", TOP_SUPPLIERS)?;
        for (supplier, value) in &self.top_suppliers {
            writeln!(out, "{}: {}", supplier, format_currency(*value))?;
        }

        writeln!(out, "\n=== SAMPLE RECORDS ===")?;
        for record in &self.sample {
            writeln!(
                out,
                "{} | {} | {} | {}",
                record.voucher.as_deref().unwrap_or_default(),
                record.supplier_name.as_deref().unwrap_or_default(),
                record.amount.map(format_currency).unwrap_or_default(),
                record.invalid_reason.as_deref().unwrap_or_default(),
            )?;
        }

        Ok(())
    }
}

/// Groups rows by key, ascending. Rows without a key are left out.
fn group_by<F>(records: &[InvalidVoucherRecord], key: F) -> Result<Vec<Group>, LoadError>
where
    F: Fn(&InvalidVoucherRecord) -> Option<&str>,
{
    let mut groups: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
    for record in records {
        if let Some(key) = key(record) {
            let (count, total) = groups.entry(key).or_insert((0, Decimal::ZERO));
            if record.grn_no.is_some() {
                *count += 1;
            }
            *total = add_amount(*total, record)?;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, (count, total))| Group {
            key: key.to_string(),
            count,
            total: total.round_dp(2),
        })
        .collect())
}

/// Suppliers with the highest summed amount. Ties keep first-seen order.
fn top_suppliers(records: &[InvalidVoucherRecord], limit: usize) -> Result<Vec<(String, Decimal)>, LoadError> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for record in records {
        if let Some(supplier) = record.supplier_name.as_deref() {
            let total = totals.entry(supplier).or_insert_with(|| {
                order.push(supplier);
                Decimal::ZERO
            });
            *total = add_amount(*total, record)?;
        }
    }

    let mut suppliers: Vec<(String, Decimal)> = order
        .into_iter()
        .map(|supplier| (supplier.to_string(), totals[supplier]))
        .collect();
    suppliers.sort_by(|a, b| b.1.cmp(&a.1));
    suppliers.truncate(limit);

    Ok(suppliers)
}

fn add_amount(total: Decimal, record: &InvalidVoucherRecord) -> Result<Decimal, LoadError> {
    total
        .checked_add(record.amount.unwrap_or_default())
        .ok_or_else(|| LoadError::Overflow(AMOUNT_COLUMN.to_string()))
}

fn write_groups(out: &mut dyn io::Write, groups: &[Group]) -> io::Result<()> {
    let width = groups.iter().map(|group| group.key.chars().count()).max().unwrap_or_default();
    for group in groups {
        writeln!(
            out,
            "{:<width$}  {:>6}  {}",
            group.key,
            group.count,
            format_currency(group.total),
            width = width
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const VOUCHERS: &str = "\
grn_no,voucher,supplier_name,nett_grn_amt,invalid_reason,voucher_prefix
G1,INV001,Acme,100.50,Voucher not found,INV
G2,INV001,Bolt,50,Voucher not found,INV
G3,CHQ9,Acme,25.25,Cheque reference,CHQ
G4,X1,Delta,,Unknown format,X
G5,INV002,Bolt,60,Voucher not found,INV
";

    #[test]
    fn test_summary_totals() -> Result<()> {
        let records = read_records(VOUCHERS.as_bytes())?;
        let summary = Summary::from_records(&records)?;

        assert_eq!(*summary.total_records(), 5);
        assert_eq!(*summary.total_value(), dec!(235.75));
        assert_eq!(*summary.unique_vouchers(), 4);
        assert_eq!(summary.average_value().map(|v| v.round_dp(4)), Some(dec!(58.9375)));

        Ok(())
    }

    #[test]
    fn test_groups_are_sorted_by_key() -> Result<()> {
        let records = read_records(VOUCHERS.as_bytes())?;
        let summary = Summary::from_records(&records)?;

        let reasons: Vec<(&str, usize, Decimal)> = summary
            .by_reason()
            .iter()
            .map(|group| (group.key.as_str(), group.count, group.total))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("Cheque reference", 1, dec!(25.25)),
                ("Unknown format", 1, dec!(0)),
                ("Voucher not found", 3, dec!(210.50)),
            ]
        );

        let prefixes: Vec<&str> = summary.by_prefix().iter().map(|group| group.key.as_str()).collect();
        assert_eq!(prefixes, vec!["CHQ", "INV", "X"]);

        Ok(())
    }

    #[test]
    fn test_top_suppliers() -> Result<()> {
        let records = read_records(VOUCHERS.as_bytes())?;
        let summary = Summary::from_records(&records)?;

        assert_eq!(
            summary.top_suppliers(),
            &vec![
                ("Acme".to_string(), dec!(125.75)),
                ("Bolt".to_string(), dec!(110)),
                ("Delta".to_string(), dec!(0)),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_top_suppliers_ties_keep_file_order() -> Result<()> {
        let record = |supplier: &str| InvalidVoucherRecord {
            grn_no: None,
            voucher: None,
            supplier_name: Some(supplier.to_string()),
            amount: Some(dec!(1)),
            invalid_reason: None,
            voucher_prefix: None,
        };
        let records: Vec<InvalidVoucherRecord> = ["F", "E", "D", "C", "B", "A"].into_iter().map(record).collect();

        let top: Vec<String> = top_suppliers(&records, 5)?.into_iter().map(|(name, _)| name).collect();
        assert_eq!(top, vec!["F", "E", "D", "C", "B"]);

        Ok(())
    }

    #[test]
    fn test_missing_column() {
        match read_records("voucher,nett_grn_amt\nA,1\n".as_bytes()) {
            Err(LoadError::MissingColumn(column)) => assert_eq!(column, "grn_no"),
            other => panic!("expected a missing column error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_averages_nothing() -> Result<()> {
        let records = read_records("grn_no,voucher,supplier_name,nett_grn_amt,invalid_reason,voucher_prefix\n".as_bytes())?;
        let summary = Summary::from_records(&records)?;

        assert_eq!(*summary.total_records(), 0);
        assert_eq!(*summary.average_value(), None);

        Ok(())
    }

    #[test]
    fn test_write_summary() -> Result<()> {
        let records = read_records(VOUCHERS.as_bytes())?;
        let mut out = Vec::new();
        Summary::from_records(&records)?.write_to(&mut out)?;
        let text = String::from_utf8(out)?;

        assert!(text.starts_with("=== INVALID VOUCHER REFERENCES SUMMARY ===\nTotal Records: 5\nTotal Value: R235.75\n"));
        assert!(text.contains("Voucher not found       3  R210.50\n"));
        assert!(text.contains("=== TOP 5 SUPPLIERS BY INVALID VALUE ===\nAcme: R125.75\nBolt: R110.00\nDelta: R0.00\n"));
        assert!(text.contains("INV001 | Acme | R100.50 | Voucher not found\n"));

        Ok(())
    }

    #[test]
    fn test_missing_markers_read_as_none() -> Result<()> {
        let records = read_records(
            "grn_no,voucher,supplier_name,nett_grn_amt,invalid_reason,voucher_prefix\n\
             G1,INV001,Acme,100.5,Voucher not found,INV\n\
             G2,NA,null,NA,N/A,NaN\n\
             G3,INV002,Acme,200.25,Voucher not found,INV\n"
                .as_bytes(),
        )?;

        assert_eq!(records[1].voucher, None);
        assert_eq!(records[1].supplier_name, None);
        assert_eq!(records[1].amount, None);

        let summary = Summary::from_records(&records)?;
        assert_eq!(*summary.total_records(), 3);
        assert_eq!(*summary.total_value(), dec!(300.75));
        assert_eq!(*summary.unique_vouchers(), 2);
        assert_eq!(summary.by_reason().len(), 1);

        Ok(())
    }

    #[test]
    fn test_invalid_amount_is_rejected() {
        let err = read_records("grn_no,voucher,supplier_name,nett_grn_amt,invalid_reason,voucher_prefix\nG1,A,B,abc,C,D\n".as_bytes())
            .unwrap_err();

        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn test_overflowing_total() -> Result<()> {
        let records = read_records(
            "grn_no,voucher,supplier_name,nett_grn_amt,invalid_reason,voucher_prefix\n\
             G1,A,Acme,79228162514264337593543950335,R,P\n\
             G2,B,Acme,1,R,P\n"
                .as_bytes(),
        )?;

        match Summary::from_records(&records) {
            Err(err) => assert_eq!(err.to_string(), "column 'nett_grn_amt' overflowed"),
            Ok(_) => anyhow::bail!("summing past the decimal range should fail"),
        }

        Ok(())
    }

    #[test]
    fn test_group_count_skips_missing_grn() -> Result<()> {
        let records = read_records(
            "grn_no,voucher,supplier_name,nett_grn_amt,invalid_reason,voucher_prefix\n\
             G1,A,Acme,10,Voucher not found,INV\n\
             ,B,Acme,5,Voucher not found,INV\n"
                .as_bytes(),
        )?;
        let summary = Summary::from_records(&records)?;

        assert_eq!(summary.by_reason()[0].count, 1);
        assert_eq!(summary.by_reason()[0].total, dec!(15));

        Ok(())
    }
}
