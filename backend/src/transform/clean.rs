//! Cleaning operations: duplicate removal and mean imputation.
//!
//! Both operations mutate the table in place and are idempotent once the data
//! is clean. Column names and types never change.

use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Cell, Table};

/// Which cleaning steps to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    pub deduplicate: bool,
    pub impute: bool,
}

/// What a cleaning pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub duplicates_removed: Option<usize>,
    pub imputation: Option<ImputeReport>,
}

/// Per-column outcome of mean imputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputeReport {
    /// Columns where missing cells were filled
    pub filled: Vec<ImputedColumn>,
    /// Numeric columns with no values to average; left missing
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImputedColumn {
    pub column: String,
    pub mean: f64,
    pub cells_filled: usize,
}

impl ImputeReport {
    /// Total number of cells filled across columns.
    pub fn total_filled(&self) -> usize {
        self.filled.iter().map(|c| c.cells_filled).sum()
    }
}

/// Run the selected steps, deduplication first.
pub fn clean(table: &mut Table, options: &CleanOptions) -> CleanReport {
    CleanReport {
        duplicates_removed: options.deduplicate.then(|| deduplicate(table)),
        imputation: options.impute.then(|| impute_missing(table)),
    }
}

// =============================================================================
// Deduplication
// =============================================================================

/// Hashable view of a cell. `-0.0` and `0.0` share a key, and a whole float
/// in the exact range shares the key of the equal integer.
#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Int(i64),
    Number(u64),
    Text(&'a str),
    Missing,
}

impl<'a> From<&'a Cell> for CellKey<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                CellKey::Int(*n as i64)
            }
            Cell::Number(n) => CellKey::Number(n.to_bits()),
            Cell::Text(s) => CellKey::Text(s),
            Cell::Missing => CellKey::Missing,
        }
    }
}

/// Drop rows equal to an earlier row, keeping first occurrences in order.
///
/// Returns the number of rows removed.
pub fn deduplicate(table: &mut Table) -> usize {
    let keep: Vec<bool> = {
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::new();
        (0..table.row_count())
            .map(|i| {
                let key = table
                    .columns()
                    .iter()
                    .map(|c| CellKey::from(&c.cells()[i]))
                    .collect::<Vec<_>>();
                seen.insert(key)
            })
            .collect()
    };

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        table.retain_rows(&keep);
    }
    removed
}

// =============================================================================
// Imputation
// =============================================================================

/// Mean of the present values, `None` when there are none.
pub fn column_mean(cells: &[Cell]) -> Option<f64> {
    let (sum, count) = cells
        .iter()
        .filter_map(Cell::as_number)
        .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Fill missing cells of numeric columns with that column's mean.
///
/// Means are taken over the values present before filling. Text columns are
/// untouched; a numeric column with no values at all stays missing.
pub fn impute_missing(table: &mut Table) -> ImputeReport {
    let mut report = ImputeReport::default();

    for column in table.columns_mut().iter_mut().filter(|c| c.is_numeric()) {
        let missing = column.missing_count();
        if missing == 0 {
            continue;
        }

        let Some(mean) = column_mean(column.cells()) else {
            report.skipped.push(column.name().to_string());
            continue;
        };

        for cell in column.cells_mut().iter_mut().filter(|c| c.is_missing()) {
            *cell = Cell::Number(mean);
        }

        report.filled.push(ImputedColumn {
            column: column.name().to_string(),
            mean,
            cells_filled: missing,
        });
    }

    report
}
