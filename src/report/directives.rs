use std::io;

use enum_dispatch::enum_dispatch;
use getset::Getters;

use super::Render;
use crate::data::{Cell, ColumnType, RecordSet};

const COLUMN_GAP: &str = "  ";

#[enum_dispatch(Render)]
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Title,
    SuccessMessage,
    ErrorMessage,
    Metric,
    Subheading,
    Table,
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Title {
    text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Title {
        Title { text: text.into() }
    }
}

impl Render for Title {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "{}", self.text)?;
        writeln!(out, "{}", "═".repeat(self.text.chars().count()))?;
        writeln!(out)
    }
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct SuccessMessage {
    text: String,
}

impl SuccessMessage {
    pub fn new(text: impl Into<String>) -> SuccessMessage {
        SuccessMessage { text: text.into() }
    }
}

impl Render for SuccessMessage {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "✅ {}", self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ErrorMessage {
    text: String,
}

impl ErrorMessage {
    pub fn new(text: impl Into<String>) -> ErrorMessage {
        ErrorMessage { text: text.into() }
    }
}

impl Render for ErrorMessage {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "❌ {}", self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Metric {
    label: String,
    value: String,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Metric {
        Metric {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl Render for Metric {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "{}: {}", self.label, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Subheading {
    text: String,
}

impl Subheading {
    pub fn new(text: impl Into<String>) -> Subheading {
        Subheading { text: text.into() }
    }
}

impl Render for Subheading {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.text)?;
        writeln!(out, "{}", "─".repeat(self.text.chars().count()))
    }
}

/// A slice of records with their headers. Rows keep their position in the
/// source file, which is shown as a leading index column.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Table {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_records(records: &RecordSet, limit: usize) -> Table {
        Table {
            columns: records.columns().clone(),
            column_types: records.column_types().clone(),
            rows: records.head(limit).to_vec(),
        }
    }

    fn lines(&self) -> Vec<String> {
        let index_width = self.rows.len().saturating_sub(1).to_string().len();

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::to_string).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        let mut lines = Vec::with_capacity(cells.len() + 2);

        let mut header = " ".repeat(index_width);
        for (i, column) in self.columns.iter().enumerate() {
            header.push_str(COLUMN_GAP);
            header.push_str(&self.align(i, column, widths[i]));
        }
        lines.push(header.trim_end().to_string());

        let total_width = index_width + widths.iter().map(|width| width + COLUMN_GAP.len()).sum::<usize>();
        lines.push("─".repeat(total_width));

        for (position, row) in cells.iter().enumerate() {
            let mut line = format!("{:>width$}", position, width = index_width);
            for (i, cell) in row.iter().enumerate() {
                line.push_str(COLUMN_GAP);
                line.push_str(&self.align(i, cell, widths[i]));
            }
            lines.push(line.trim_end().to_string());
        }

        lines
    }

    fn align(&self, column: usize, text: &str, width: usize) -> String {
        let padding = " ".repeat(width.saturating_sub(text.chars().count()));
        match self.column_types[column] {
            ColumnType::Numeric => format!("{}{}", padding, text),
            ColumnType::Text => format!("{}{}", text, padding),
        }
    }
}

impl Render for Table {
    fn render(&self, out: &mut dyn io::Write) -> io::Result<()> {
        for line in self.lines() {
            writeln!(out, "{}", line)?;
        }

        Ok(())
    }
}
