//! Column selection.

use std::collections::HashSet;

use crate::error::{PipelineError, PipelineResult};
use crate::models::Table;

/// Restrict `table` to exactly `columns`, in the requested order.
///
/// An empty selection yields a table with no columns. Unknown names reject
/// the whole projection; every missing name is reported.
pub fn project(table: &Table, columns: &[String]) -> PipelineResult<Table> {
    let indices = resolve(table, columns)?;
    Ok(table.select_indices(&indices))
}

/// Apply an optional selection; `None` keeps every column.
pub fn project_selection(table: &Table, columns: Option<&[String]>) -> PipelineResult<Table> {
    match columns {
        Some(columns) => project(table, columns),
        None => Ok(table.clone()),
    }
}

/// Check a selection against the table without building the projection.
pub fn validate_selection(table: &Table, columns: &[String]) -> PipelineResult<()> {
    resolve(table, columns).map(|_| ())
}

fn resolve(table: &Table, columns: &[String]) -> PipelineResult<Vec<usize>> {
    let names = table.column_names();

    let unknown: Vec<String> = columns
        .iter()
        .filter(|c| !names.contains(c))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(PipelineError::UnknownColumn(unknown));
    }

    let mut seen = HashSet::new();
    let mut indices = Vec::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::DuplicateSelection(name.clone()));
        }
        if let Some(i) = names.iter().position(|n| n == name) {
            indices.push(i);
        }
    }

    Ok(indices)
}
