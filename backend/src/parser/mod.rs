//! Ingest: uploaded bytes to [`Table`].
//!
//! CSV input goes through encoding and delimiter auto-detection before the
//! `csv` tokenizer; `.xlsx` input is read from its first worksheet with
//! `calamine`. Both paths share the same missing-value rules and header
//! normalization, and both type columns as numeric or text.

use calamine::{Data, ExcelDateTime, Reader, Xlsx};
use chrono::NaiveTime;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use crate::error::{IngestError, IngestResult, PipelineError};
use crate::models::{extension_of, format_number, Cell, Column, FileFormat, Table, UploadedFile};

/// Tokens read as missing values (besides empty cells).
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Candidate delimiters, in tie-breaking order.
const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Parsed table plus how it was read.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub table: Table,
    pub info: ParseInfo,
}

/// Metadata about the parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseInfo {
    /// Detected text encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
    /// Worksheet read (spreadsheet only)
    pub sheet: Option<String>,
}

// =============================================================================
// Entry points
// =============================================================================

/// Detect the input format from the file name.
pub fn detect_format(name: &str) -> FileFormat {
    FileFormat::from_name(name)
}

/// Parse an uploaded file according to its detected format.
pub fn ingest(file: &UploadedFile) -> Result<Ingested, PipelineError> {
    let parsed = match file.format {
        FileFormat::Csv => parse_csv_bytes(&file.bytes),
        FileFormat::Spreadsheet => parse_xlsx_bytes(&file.bytes),
        FileFormat::Unsupported => {
            let extension = extension_of(&file.name);
            return Err(PipelineError::UnsupportedFormat {
                file: file.name.clone(),
                extension: if extension.is_empty() {
                    "no extension".to_string()
                } else {
                    extension
                },
            });
        }
    };

    parsed.map_err(|source| PipelineError::Ingest {
        file: file.name.clone(),
        source,
    })
}

/// Read a file from disk as an upload.
pub fn read_upload<P: AsRef<Path>>(path: P) -> std::io::Result<UploadedFile> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(name, bytes))
}

// =============================================================================
// CSV
// =============================================================================

/// Detect the encoding of raw bytes. Valid UTF-8 short-circuits chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes using the given encoding label. A leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> IngestResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        // encoding_rs follows WHATWG: latin-1 is a superset alias of windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()
        }
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.to_string(),
            None => String::from_utf8(bytes.to_vec())
                .map_err(|_| IngestError::Encoding(format!("unsupported encoding '{}'", label)))?,
        },
    };

    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Comma wins ties, and is the answer when nothing else appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best = ',';
    let mut best_count = 0;
    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Parse CSV bytes with encoding and delimiter auto-detection.
pub fn parse_csv_bytes(bytes: &[u8]) -> IngestResult<Ingested> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(Ingested {
        table,
        info: ParseInfo {
            encoding: Some(encoding),
            delimiter: Some(delimiter),
            sheet: None,
        },
    })
}

/// Parse CSV text with an explicit delimiter. The first record is the header.
pub fn parse_csv_str(content: &str, delimiter: char) -> IngestResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(IngestError::Empty),
    };
    let headers = normalize_headers(header.iter().map(str::to_string).collect());

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in records {
        let record = record?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            return Err(IngestError::Malformed {
                line,
                message: format!(
                    "expected {} fields, saw {}",
                    headers.len(),
                    record.len()
                ),
            });
        }
        for (i, values) in raw.iter_mut().enumerate() {
            values.push(record.get(i).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, values)| column_from_text(name, values))
        .collect();

    Ok(Table::new(columns)?)
}

/// Type a column of raw strings: numeric when every present value parses.
fn column_from_text(name: String, values: Vec<String>) -> Column {
    let cells: Vec<Cell> = values
        .iter()
        .map(|v| {
            if is_missing_token(v) {
                Cell::Missing
            } else {
                parse_number(v).unwrap_or(Cell::Missing)
            }
        })
        .collect();

    let numeric = values
        .iter()
        .all(|v| is_missing_token(v) || parse_number(v).is_some());

    if numeric {
        return Column::from_cells(name, cells);
    }

    let cells = values
        .into_iter()
        .map(|v| if is_missing_token(&v) { Cell::Missing } else { Cell::Text(v) })
        .collect();
    Column::from_cells(name, cells)
}

fn is_missing_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || NA_TOKENS.contains(&trimmed)
}

/// Integers stay exact; anything else numeric becomes a float.
fn parse_number(value: &str) -> Option<Cell> {
    let trimmed = value.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Cell::Int(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| !n.is_nan())
        .map(Cell::Number)
}

/// Name empty headers `Unnamed: i` and suffix repeats as `name.1`, `name.2`.
pub fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        result.push(name);
    }

    result
}

// =============================================================================
// Spreadsheet
// =============================================================================

/// Parse the first worksheet of an `.xlsx` workbook.
pub fn parse_xlsx_bytes(bytes: &[u8]) -> IngestResult<Ingested> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| IngestError::Spreadsheet(format!("cannot open workbook: {}", e)))?;

    let sheet = workbook.sheet_names().first().cloned();

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Spreadsheet("no worksheet found".to_string()))?
        .map_err(|e| IngestError::Spreadsheet(format!("cannot read worksheet: {}", e)))?;

    let mut rows = range
        .rows()
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)));

    let header = rows.next().ok_or(IngestError::Empty)?;
    let headers = normalize_headers(header.iter().map(header_text).collect());

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(row.get(i).map(spreadsheet_cell).unwrap_or(Cell::Missing));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column::from_cells(name, cells))
        .collect();

    Ok(Ingested {
        table: Table::new(columns)?,
        info: ParseInfo {
            encoding: None,
            delimiter: None,
            sheet,
        },
    })
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) => date_text(dt),
        other => other.to_string(),
    }
}

/// Largest magnitude below which every whole `f64` is an exact integer.
const EXACT_FLOAT_LIMIT: f64 = 9_007_199_254_740_992.0;

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.is_nan() => Cell::Missing,
        Data::Float(f) if f.fract() == 0.0 && f.abs() < EXACT_FLOAT_LIMIT => Cell::Int(*f as i64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if is_missing_token(s) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => Cell::Text(date_text(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Empty | Data::Error(_) => Cell::Missing,
    }
}

/// Render an Excel date serial as ISO text, dropping a midnight time.
fn date_text(dt: &ExcelDateTime) -> String {
    match dt.as_datetime() {
        Some(value) if value.time() == NaiveTime::MIN => value.format("%Y-%m-%d").to_string(),
        Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_number(dt.as_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnType;

    #[test]
    fn test_simple_csv() {
        let table = parse_csv_str("name,age\nAlice,30\nBob,25", ',').unwrap();

        assert_eq!(table.column_names(), vec!["name", "age"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("age").unwrap().kind(), ColumnType::Numeric);
        assert_eq!(table.column("age").unwrap().cells()[0], Cell::Int(30));
        assert_eq!(table.column("name").unwrap().cells()[1], Cell::Text("Bob".into()));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name;value\n\"Alice\";\"Hello; World\"\n\"Bob\";\"line\nbreak\"";
        let table = parse_csv_str(csv, ';').unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("value").unwrap().cells()[0],
            Cell::Text("Hello; World".into())
        );
        assert_eq!(
            table.column("value").unwrap().cells()[1],
            Cell::Text("line\nbreak".into())
        );
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_csv_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_missing_values() {
        let table = parse_csv_str("a,b,c\n1,,3\n4,NA,6\n7,8", ',').unwrap();

        let b = table.column("b").unwrap();
        assert!(b.is_numeric());
        assert!(b.cells()[0].is_missing());
        assert!(b.cells()[1].is_missing());
        assert_eq!(b.cells()[2], Cell::Int(8));
        assert!(table.column("c").unwrap().cells()[2].is_missing());
    }

    #[test]
    fn test_text_column_keeps_original_spelling() {
        let table = parse_csv_str("code\n007\nabc", ',').unwrap();
        let code = table.column("code").unwrap();
        assert_eq!(code.kind(), ColumnType::Text);
        assert_eq!(code.cells()[0], Cell::Text("007".into()));
    }

    #[test]
    fn test_extra_fields_rejected() {
        let err = parse_csv_str("a,b\n1,2,3", ',').unwrap_err();
        match err {
            IngestError::Malformed { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("expected 2"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_csv_str("", ','), Err(IngestError::Empty)));
    }

    #[test]
    fn test_header_only() {
        let table = parse_csv_str("a,b\n", ',').unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_duplicate_and_empty_headers() {
        let headers = normalize_headers(vec![
            "a".into(),
            "a".into(),
            "".into(),
            "a".into(),
        ]);
        assert_eq!(headers, vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single\n1"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_csv_bytes(b"name;age\nAlice;30\nBob;25").unwrap();

        assert_eq!(result.info.delimiter, Some(';'));
        assert_eq!(result.info.encoding.as_deref(), Some("utf-8"));
        assert_eq!(result.table.row_count(), 2);
        assert_eq!(result.table.column_names(), vec!["name", "age"]);
    }

    #[test]
    fn test_bom_stripped() {
        let result = parse_csv_bytes("\u{feff}id,x\n1,2".as_bytes()).unwrap();
        assert_eq!(result.table.column_names(), vec!["id", "x"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_and_latin9_differ_on_currency_sign() {
        let bytes: &[u8] = &[0x70, 0x72, 0x69, 0x78, 0x20, 0xA4];
        assert_eq!(decode_content(bytes, "iso-8859-1").unwrap(), "prix ¤");
        assert_eq!(decode_content(bytes, "latin1").unwrap(), "prix ¤");
        assert_eq!(decode_content(bytes, "iso-8859-15").unwrap(), "prix €");
    }

    #[test]
    fn test_ingest_unsupported_extension() {
        let file = UploadedFile::new("notes.txt", b"hello".to_vec());
        match ingest(&file) {
            Err(PipelineError::UnsupportedFormat { file, extension }) => {
                assert_eq!(file, "notes.txt");
                assert_eq!(extension, ".txt");
            }
            other => panic!("unexpected result: {:?}", other.map(|i| i.table)),
        }
    }

    #[test]
    fn test_spreadsheet_dates_read_as_iso_text() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 3, 15).unwrap();
        sheet.write_string(0, 0, "when").unwrap();
        sheet.write_string(0, 1, "qty").unwrap();
        sheet.write_datetime_with_format(1, 0, &date, &date_format).unwrap();
        sheet.write_number(1, 1, 3.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = parse_xlsx_bytes(&bytes).unwrap().table;
        let when = table.column("when").unwrap();
        assert_eq!(when.kind(), ColumnType::Text);
        assert_eq!(when.cells()[0], Cell::Text("2024-03-15".into()));
        assert_eq!(table.column("qty").unwrap().cells()[0], Cell::Int(3));
    }

    #[test]
    fn test_spreadsheet_whole_floats_become_integers() {
        assert_eq!(spreadsheet_cell(&Data::Float(12.0)), Cell::Int(12));
        assert_eq!(spreadsheet_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(spreadsheet_cell(&Data::Float(1e20)), Cell::Number(1e20));
        assert_eq!(spreadsheet_cell(&Data::Int(-7)), Cell::Int(-7));
    }

    #[test]
    fn test_integers_parse_exactly() {
        assert_eq!(parse_number("9007199254740993"), Some(Cell::Int(9_007_199_254_740_993)));
        assert_eq!(parse_number(" -12 "), Some(Cell::Int(-12)));
        assert_eq!(parse_number("2.50"), Some(Cell::Number(2.5)));
        assert_eq!(parse_number("1e3"), Some(Cell::Number(1000.0)));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_ingest_bad_workbook() {
        let file = UploadedFile::new("broken.xlsx", b"not a zip".to_vec());
        assert!(matches!(
            ingest(&file),
            Err(PipelineError::Ingest {
                source: IngestError::Spreadsheet(_),
                ..
            })
        ));
    }

    #[test]
    fn test_read_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Data.CSV");
        std::fs::write(&path, "a\n1").unwrap();

        let upload = read_upload(&path).unwrap();
        assert_eq!(upload.name, "Data.CSV");
        assert_eq!(upload.format, FileFormat::Csv);
        assert_eq!(upload.size(), 3);
    }
}
