//! Column-addressable table over CSV data

use statline_error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// An immutable, ordered table of string records with a header row.
///
/// Rows keep their file order; all aggregates are deterministic, so
/// re-running them on the same table always yields the same answer.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// The row with the maximum value of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct TopResult {
    /// Original row index (0-based, excluding the header)
    pub row: usize,
    /// Value of the label column for that row
    pub label: String,
    /// The maximum value itself
    pub value: f64,
}

/// One per-group aggregate from [`Table::sum_by`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSum {
    /// Value of the grouping column
    pub key: String,
    /// Sum of the value column over the group
    pub total: f64,
}

impl Table {
    /// Load a table from a CSV file with a header row.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                Error::csv_failed(format!("failed to open {}: {}", path.display(), e))
                    .with_operation("table::from_path")
                    .with_context("path", path.display().to_string())
                    .set_source(e)
            })?;

        Self::read_records(rdr).map_err(|e| e.with_operation("table::from_path"))
    }

    /// Load a table from any reader producing CSV with a header row.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        Self::read_records(rdr).map_err(|e| e.with_operation("table::from_reader"))
    }

    fn read_records<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| Error::csv_failed(format!("bad header row: {}", e)).set_source(e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| Error::csv_failed(format!("CSV parse error: {}", e)).set_source(e))?;
            rows.push(record.iter().map(|s| s.trim().to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name to its position.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| {
                Error::column_not_found(name)
                    .with_operation("table::column_index")
                    .with_context("available", self.headers.join(", "))
            })
    }

    /// Get a single cell. Missing cells on short rows read as "".
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Render the header plus the first `n` rows, pipe-separated.
    /// Used for prompts and the preview tool.
    pub fn preview(&self, n: usize) -> String {
        let mut out = String::new();
        out.push_str(&self.headers.join(" | "));
        out.push('\n');
        for row in self.rows.iter().take(n) {
            out.push_str(&row.join(" | "));
            out.push('\n');
        }
        if self.rows.len() > n {
            let rest = self.rows.len() - n;
            let noun = if rest == 1 { "row" } else { "rows" };
            out.push_str(&format!("... ({} more {})\n", rest, noun));
        }
        out
    }

    fn numeric(&self, column: &str, col: usize, row: usize) -> Result<f64> {
        let cell = self.cell(row, col);
        cell.parse::<f64>().map_err(|_| {
            Error::value_not_numeric(column, row, cell).with_operation("table::numeric")
        })
    }

    /// The row holding the maximum numeric value of `value_col`, labeled by
    /// `label_col`. Ties keep the first row in file order (strict `>` while
    /// scanning).
    pub fn top_by(&self, label_col: &str, value_col: &str) -> Result<TopResult> {
        let label_idx = self.column_index(label_col)?;
        let value_idx = self.column_index(value_col)?;

        if self.rows.is_empty() {
            return Err(Error::empty_table().with_operation("table::top_by"));
        }

        let mut best_row = 0usize;
        let mut best_value = self.numeric(value_col, value_idx, 0)?;
        for row in 1..self.rows.len() {
            let value = self.numeric(value_col, value_idx, row)?;
            if value > best_value {
                best_value = value;
                best_row = row;
            }
        }

        Ok(TopResult {
            row: best_row,
            label: self.cell(best_row, label_idx).to_string(),
            value: best_value,
        })
    }

    /// Sum `value_col` per distinct value of `group_col`, ordered by
    /// descending total. Equal totals keep first-appearance order
    /// (stable sort over insertion order).
    pub fn sum_by(&self, group_col: &str, value_col: &str) -> Result<Vec<GroupSum>> {
        let group_idx = self.column_index(group_col)?;
        let value_idx = self.column_index(value_col)?;

        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, f64> = HashMap::new();

        for row in 0..self.rows.len() {
            let key = self.cell(row, group_idx).to_string();
            let value = self.numeric(value_col, value_idx, row)?;
            if !totals.contains_key(&key) {
                order.push(key.clone());
            }
            *totals.entry(key).or_insert(0.0) += value;
        }

        let mut sums: Vec<GroupSum> = order
            .into_iter()
            .map(|key| {
                let total = totals[&key];
                GroupSum { key, total }
            })
            .collect();

        // Vec::sort_by is stable, so insertion order survives ties.
        sums.sort_by(|a, b| b.total.total_cmp(&a.total));

        Ok(sums)
    }
}
