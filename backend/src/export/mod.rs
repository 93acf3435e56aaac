//! Export: [`Table`] to downloadable CSV or `.xlsx` bytes.
//!
//! Neither format carries a row index column. CSV rows are `\n` terminated and
//! quoted only where needed; the workbook has a single `Sheet1` with a bold
//! header row.

use rust_xlsxwriter::{Format, Workbook};

use crate::error::PipelineError;
use crate::models::{Cell, ConversionRequest, ExportArtifact, OutputFormat, Table};

/// Name of the single worksheet written.
pub const SHEET_NAME: &str = "Sheet1";

/// Integers up to 2^53 survive the worksheet's `f64` storage.
const EXACT_INT_LIMIT: u64 = 1 << 53;

/// Serialize `table` as requested.
pub fn export(table: &Table, request: &ConversionRequest) -> Result<ExportArtifact, PipelineError> {
    let bytes = match request.format {
        OutputFormat::Csv => write_csv(table),
        OutputFormat::Spreadsheet => write_xlsx(table),
    }
    .map_err(|message| PipelineError::ExportFailed {
        file: request.file_name.clone(),
        message,
    })?;

    Ok(ExportArtifact {
        file_name: request.file_name.clone(),
        mime_type: request.mime_type,
        bytes,
    })
}

/// Comma separated values with a header row.
pub fn write_csv(table: &Table) -> Result<Vec<u8>, String> {
    if table.column_count() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(|e| e.to_string())?;

    for row in table.rows() {
        writer
            .write_record(row.iter().map(Cell::to_text))
            .map_err(|e| e.to_string())?;
    }

    writer.into_inner().map_err(|e| e.to_string())
}

/// Single-sheet workbook with a bold header row.
pub fn write_xlsx(table: &Table) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(|e| e.to_string())?;

    for (c, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(c).map_err(|_| "too many columns for a worksheet".to_string())?;

        worksheet
            .write_string_with_format(0, col, column.name(), &header_format)
            .map_err(|e| e.to_string())?;

        for (r, cell) in column.cells().iter().enumerate() {
            let row = u32::try_from(r + 1).map_err(|_| "too many rows for a worksheet".to_string())?;
            match cell {
                // Excel stores numbers as f64; larger integers keep their digits as text
                Cell::Int(i) if i.unsigned_abs() <= EXACT_INT_LIMIT => {
                    worksheet.write_number(row, col, *i as f64).map_err(|e| e.to_string())?;
                }
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(row, col, *n).map_err(|e| e.to_string())?;
                }
                Cell::Missing => {}
                other => {
                    worksheet
                        .write_string(row, col, other.to_text())
                        .map_err(|e| e.to_string())?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_csv_str, parse_xlsx_bytes};

    fn sample() -> Table {
        Table::from_rows(
            &["name", "val", "note"],
            vec![
                vec!["a".into(), Cell::Int(1), "plain".into()],
                vec!["b, c".into(), Cell::Number(2.5), Cell::Missing],
                vec!["d".into(), Cell::Missing, "say \"hi\"".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_output_format() {
        let bytes = write_csv(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "name,val,note\na,1,plain\n\"b, c\",2.5,\nd,,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let table = sample();
        let text = String::from_utf8(write_csv(&table).unwrap()).unwrap();
        assert_eq!(parse_csv_str(&text, ',').unwrap(), table);
    }

    #[test]
    fn test_xlsx_round_trip() {
        let table = sample();
        let bytes = write_xlsx(&table).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let parsed = parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(parsed.info.sheet.as_deref(), Some(SHEET_NAME));
        assert_eq!(parsed.table, table);
    }

    #[test]
    fn test_large_integer_ids_survive_csv() {
        let input = "id,name\n9007199254740993,a\n1234567890123456789,b\n";
        let table = parse_csv_str(input, ',').unwrap();

        assert!(table.column("id").unwrap().is_numeric());
        assert_eq!(table.column("id").unwrap().cells()[0], Cell::Int(9_007_199_254_740_993));

        let output = String::from_utf8(write_csv(&table).unwrap()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_large_integer_ids_survive_xlsx() {
        let table = Table::from_rows(
            &["id"],
            vec![vec![Cell::Int(42)], vec![Cell::Int(9_007_199_254_740_993)]],
        )
        .unwrap();

        let parsed = parse_xlsx_bytes(&write_xlsx(&table).unwrap()).unwrap();
        let cells = parsed.table.column("id").unwrap().cells().to_vec();
        assert_eq!(cells[0].to_text(), "42");
        assert_eq!(cells[1].to_text(), "9007199254740993");
    }

    #[test]
    fn test_export_artifact_metadata() {
        let request = ConversionRequest::new("data.csv", OutputFormat::Spreadsheet);
        let artifact = export(&sample(), &request).unwrap();

        assert_eq!(artifact.file_name, "data.xlsx");
        assert_eq!(
            artifact.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert!(!artifact.bytes.is_empty());

        let request = ConversionRequest::new("book.xlsx", OutputFormat::Csv);
        let artifact = export(&sample(), &request).unwrap();
        assert_eq!(artifact.file_name, "book.csv");
        assert_eq!(artifact.mime_type, "text/csv");
        assert!(artifact.bytes.starts_with(b"name,val,note\n"));
    }

    #[test]
    fn test_oversized_cell_reports_export_failed() {
        let long = "x".repeat(40_000);
        let table = Table::from_rows(&["t"], vec![vec![long.as_str().into()]]).unwrap();
        let request = ConversionRequest::new("big.csv", OutputFormat::Spreadsheet);

        match export(&table, &request) {
            Err(PipelineError::ExportFailed { file, .. }) => assert_eq!(file, "big.xlsx"),
            other => panic!("unexpected result: {:?}", other.map(|a| a.file_name)),
        }
    }
}
