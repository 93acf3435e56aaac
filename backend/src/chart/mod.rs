//! Bar chart data for one numeric column.
//!
//! With no explicit choice the chart uses the third numeric column (in table
//! order). The chart is display-only and never touches the table.

use serde::Serialize;

use crate::error::ChartError;
use crate::models::Table;

/// Position among numeric columns used when no column is chosen.
pub const DEFAULT_NUMERIC_POSITION: usize = 2;

/// One bar per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChart {
    pub column: String,
    pub bars: Vec<Bar>,
    /// Smallest present value, if any
    pub min: Option<f64>,
    /// Largest present value, if any
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Row index label
    pub label: String,
    /// `None` for a missing cell
    pub value: Option<f64>,
}

/// Build chart data for `column`, or for the default numeric column.
pub fn bar_chart(table: &Table, column: Option<&str>) -> Result<BarChart, ChartError> {
    let selected = match column {
        Some(name) => {
            let col = table
                .column(name)
                .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
            if !col.is_numeric() {
                return Err(ChartError::NotNumeric(name.to_string()));
            }
            col
        }
        None => {
            let numeric = table.numeric_columns();
            numeric
                .get(DEFAULT_NUMERIC_POSITION)
                .copied()
                .ok_or(ChartError::NotEnoughNumericColumns {
                    needed: DEFAULT_NUMERIC_POSITION + 1,
                    found: numeric.len(),
                })?
        }
    };

    let bars: Vec<Bar> = selected
        .cells()
        .iter()
        .enumerate()
        .map(|(i, cell)| Bar {
            label: i.to_string(),
            value: cell.as_number(),
        })
        .collect();

    let present = || bars.iter().filter_map(|b| b.value);
    let min = present().reduce(f64::min);
    let max = present().reduce(f64::max);

    Ok(BarChart {
        column: selected.name().to_string(),
        bars,
        min,
        max,
    })
}
