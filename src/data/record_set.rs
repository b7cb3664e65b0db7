use std::fs::File;
use std::io;
use std::path::Path;

use getset::Getters;
use log::debug;
use rust_decimal::Decimal;

use super::{checked_sum, is_missing, parse_number, Cell, ColumnType, LoadError};

/// Rows of a CSV file, fully materialized, with one inferred type per column.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct RecordSet {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<Vec<Cell>>,
}

impl RecordSet {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecordSet, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let record_set = RecordSet::from_reader(file)?;
        debug!(
            "loaded records, path={}, rows={}, columns={}",
            path.display(),
            record_set.len(),
            record_set.columns.len()
        );

        Ok(record_set)
    }

    /// The header row is required. Short rows are padded with empty cells,
    /// rows with more fields than the header are rejected.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<RecordSet, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() {
            return Err(LoadError::MissingHeader);
        }

        let mut fields: Vec<Vec<String>> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.len() > columns.len() {
                return Err(LoadError::RaggedRow {
                    line: record.position().map(|pos| pos.line()).unwrap_or_default(),
                    expected: columns.len(),
                    found: record.len(),
                });
            }

            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(columns.len(), String::new());
            fields.push(row);
        }

        let column_types: Vec<ColumnType> = (0..columns.len())
            .map(|index| infer_column_type(fields.iter().map(|row| row[index].as_str())))
            .collect();

        for (column, column_type) in columns.iter().zip(&column_types) {
            debug!("inferred column type, column={}, type={:?}", column, column_type);
        }

        let rows = fields
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&column_types)
                    .map(|(field, column_type)| typed_cell(field, *column_type))
                    .collect()
            })
            .collect();

        Ok(RecordSet {
            columns,
            column_types,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// First `min(n, len)` rows, in file order.
    pub fn head(&self, n: usize) -> &[Vec<Cell>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Exact sum of a numeric column. Empty cells are skipped.
    /// A total beyond the decimal range is an `Overflow` error.
    pub fn sum_column(&self, name: &str) -> Result<Decimal, LoadError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;

        if self.column_types[index] != ColumnType::Numeric {
            return Err(LoadError::NonNumericColumn(name.to_string()));
        }

        checked_sum(self.rows.iter().filter_map(|row| row[index].as_number()), name)
    }
}

/// A column is numeric when every non-missing field parses as a number.
/// A column with no values at all counts as numeric.
fn infer_column_type<'a>(mut fields: impl Iterator<Item = &'a str>) -> ColumnType {
    if fields.all(|field| is_missing(field) || parse_number(field).is_some()) {
        ColumnType::Numeric
    } else {
        ColumnType::Text
    }
}

fn typed_cell(field: String, column_type: ColumnType) -> Cell {
    if is_missing(&field) {
        return Cell::Empty;
    }

    match column_type {
        ColumnType::Numeric => match parse_number(&field) {
            Some(value) => Cell::Number(value),
            None => Cell::Text(field),
        },
        ColumnType::Text => Cell::Text(field),
    }
}
