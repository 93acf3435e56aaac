//! Domain models for the Data Sweeper pipeline.
//!
//! - [`Cell`] - A scalar value: integer, float, text or missing
//! - [`Column`] - Named, typed sequence of cells
//! - [`Table`] - Ordered columns with unique names and equal lengths
//! - [`UploadedFile`] - Raw upload with its detected [`FileFormat`]
//! - [`OutputFormat`], [`ConversionRequest`], [`ExportArtifact`] - Export side

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::TableError;

// =============================================================================
// Cells
// =============================================================================

/// A single scalar value.
///
/// Integers are kept exact as `i64`; only values with a fraction or exponent,
/// or outside the `i64` range, are floats. Serializes as a JSON number, string
/// or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Number(_))
    }

    /// Numeric value as `f64`. Integers beyond 2^53 lose precision here.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text rendering used by CSV export and previews. Missing is empty.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Int(i) => i.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

/// Format a number the way the CSV writer emits it.
///
/// Whole numbers below 1e15 drop the decimal point, everything else uses the
/// shortest representation that parses back to the same `f64`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
}

/// A named column of cells with a uniform declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnType,
    cells: Vec<Cell>,
}

impl Column {
    /// Build a column, inferring its type from the cells.
    ///
    /// Numeric when every present cell is a number and at least one cell exists
    /// (an all-missing column is numeric). Otherwise text, with numbers
    /// rendered back to strings.
    pub fn from_cells(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let numeric = !cells.is_empty()
            && cells
                .iter()
                .all(|c| c.is_numeric() || c.is_missing());

        let (kind, cells) = if numeric {
            (ColumnType::Numeric, cells)
        } else {
            let cells = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Int(_) | Cell::Number(_) => Cell::Text(c.to_text()),
                    other => other,
                })
                .collect();
            (ColumnType::Text, cells)
        };

        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnType::Numeric
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    /// In-place access for cleaning. Callers must keep the declared type valid.
    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.cells
    }
}

// =============================================================================
// Table
// =============================================================================

/// Ordered, named columns of equal length.
///
/// The row count is kept apart from the columns so a table projected down to
/// no columns still has its rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, checking name uniqueness and equal column lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }

        let rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(TableError::RaggedColumns {
                column: bad.name.clone(),
                expected: rows,
                found: bad.len(),
            });
        }

        Ok(Self { columns, rows })
    }

    /// Build a table from a header and row-major cells.
    ///
    /// Rows shorter than the header are padded with missing cells.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let row_count = rows.len();
        let mut by_column: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in rows {
            let mut row = row.into_iter();
            for cells in by_column.iter_mut() {
                cells.push(row.next().unwrap_or(Cell::Missing));
            }
        }

        let columns = headers
            .iter()
            .zip(by_column)
            .map(|(name, cells)| Column::from_cells(*name, cells))
            .collect();

        let mut table = Self::new(columns)?;
        table.rows = row_count;
        Ok(table)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Numeric columns in table order.
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Cells of row `index`, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    /// Row-major copy of all cells.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        (0..self.row_count())
            .map(|i| self.columns.iter().map(|c| c.cells[i].clone()).collect())
            .collect()
    }

    /// First `n` rows as a new table. Column types are kept.
    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                cells: c.cells.iter().take(n).cloned().collect(),
            })
            .collect();
        Table {
            columns,
            rows: n.min(self.rows),
        }
    }

    /// Keep only rows whose flag is `true`. `keep` must have one flag per row.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.row_count());
        for col in &mut self.columns {
            let mut flags = keep.iter();
            col.cells.retain(|_| *flags.next().unwrap_or(&true));
        }
        self.rows = keep.iter().filter(|k| **k).count();
    }

    /// Columns picked by position, in the given order.
    pub(crate) fn select_indices(&self, indices: &[usize]) -> Table {
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self.rows,
        }
    }
}

// =============================================================================
// Uploads
// =============================================================================

/// Input format detected from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Spreadsheet,
    Unsupported,
}

impl FileFormat {
    /// Case-insensitive match on the final extension.
    pub fn from_name(name: &str) -> Self {
        match extension_of(name).as_str() {
            ".csv" => FileFormat::Csv,
            ".xlsx" => FileFormat::Spreadsheet,
            _ => FileFormat::Unsupported,
        }
    }
}

/// Lowercased final extension including the dot, or an empty string.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// A file as received from the upload boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: FileFormat,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let format = FileFormat::from_name(&name);
        Self { name, bytes, format }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// Size in KB with two decimals, e.g. `"1.50 KB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.size_kb())
    }
}

// =============================================================================
// Export
// =============================================================================

/// Target format for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "xlsx", alias = "excel", alias = "spreadsheet")]
    Spreadsheet,
}

impl OutputFormat {
    /// Canonical extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Spreadsheet => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "text/csv",
            OutputFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "CSV",
            OutputFormat::Spreadsheet => "Excel",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" | "excel" | "spreadsheet" => Ok(OutputFormat::Spreadsheet),
            other => Err(format!("unknown output format '{}' (expected csv or xlsx)", other)),
        }
    }
}

/// Target format plus the derived download name and MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub format: OutputFormat,
    pub file_name: String,
    pub mime_type: &'static str,
}

impl ConversionRequest {
    /// Derive the output name by swapping the original extension.
    pub fn new(original_name: &str, format: OutputFormat) -> Self {
        let stem = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("converted");

        Self {
            format,
            file_name: format!("{}.{}", stem, format.extension()),
            mime_type: format.mime_type(),
        }
    }
}

/// Serialized table ready for download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}
