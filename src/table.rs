//! Tabular metric results.
//!
//! A [`MetricsTable`] has one row per text unit and one column per metric.
//! Besides construction by an extractor, a table is only ever changed by
//! inserting or moving a label column and by row-wise concatenation.
//!
//! Rendering:
//! - [`MetricsTable::write_csv`] — header row of column names, UTF-8.
//! - [`MetricsTable::transpose`] — one row per metric, used for terminal
//!   display where wide tables are unreadable.
//! - [`MetricsTable::render`] — fixed-width text for the terminal.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// A single table value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    /// Flag metrics such as `passed_quality_check`.
    Bool(bool),
    Text(String),
    Missing,
}

impl Cell {
    /// A number, or [`Cell::Missing`] when it is not finite.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Missing
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

/// Column names plus rows of cells. Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl MetricsTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from columns and rows, checking row widths.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// Set `name` to `value` on every row, appending the column if absent.
    pub fn set_column(&mut self, name: &str, value: Cell) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Move column `name` to index `pos`.
    pub fn move_column(&mut self, name: &str, pos: usize) -> Result<()> {
        if pos >= self.columns.len() {
            bail!(
                "position must be between 0 and {} (number of columns - 1), was {}",
                self.columns.len().saturating_sub(1),
                pos
            );
        }
        let idx = self
            .column_index(name)
            .ok_or_else(|| anyhow::anyhow!("no column named '{}'", name))?;

        let col = self.columns.remove(idx);
        self.columns.insert(pos, col);
        for row in &mut self.rows {
            let cell = row.remove(idx);
            row.insert(pos, cell);
        }
        Ok(())
    }

    /// Add a leading label column with the same value on every row.
    pub fn prepend_label(&mut self, column: &str, label: &str) -> Result<()> {
        self.set_column(column, Cell::from(label));
        self.move_column(column, 0)
    }

    /// Row-wise concatenation in input order.
    ///
    /// Columns are unioned in first-seen order; cells a table does not have
    /// are [`Cell::Missing`]. Rows are neither deduplicated nor reordered.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = MetricsTable>,
    {
        let tables: Vec<MetricsTable> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<Option<usize>> = columns
                .iter()
                .map(|col| table.column_index(col))
                .collect();
            for row in table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map(|i| row[i].clone()).unwrap_or(Cell::Missing))
                        .collect(),
                );
            }
        }

        Self { columns, rows }
    }

    /// One row per column of `self`: the first column (`header`) holds the
    /// original column name, then one column per original row, named by row
    /// index.
    pub fn transpose(&self, header: &str) -> Self {
        let mut columns = vec![header.to_string()];
        columns.extend((0..self.rows.len()).map(|i| i.to_string()));

        let rows = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut row = vec![Cell::from(name.as_str())];
                row.extend(self.rows.iter().map(|r| r[idx].clone()));
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).with_context(|| "CSV output is not valid UTF-8")
    }

    /// Fixed-width text rendering. Numbers are shown with four decimals and
    /// long text is cut to `max_width` characters.
    pub fn render(&self, max_width: usize) -> String {
        let format_cell = |cell: &Cell| -> String {
            let text = match cell {
                Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n),
                Cell::Number(n) => format!("{:.4}", n),
                Cell::Bool(b) => b.to_string(),
                Cell::Text(s) => s.replace('\n', " "),
                Cell::Missing => "-".to_string(),
            };
            truncate(&text, max_width)
        };

        let header: Vec<String> = self.columns.iter().map(|c| truncate(c, max_width)).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(format_cell).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let mut push_line = |cells: &[String]| {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        };

        push_line(&header[..]);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&rule[..]);
        for row in &body {
            push_line(&row[..]);
        }
        out
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
