//! High-level pipeline API: Ingest → Clean → Project → Export.
//!
//! Each file runs the stages strictly in order. A batch processes files one
//! after another and collects per-file outcomes; a failing file never stops
//! the rest of the batch.
//!
//! # Example
//!
//! ```rust,ignore
//! use datasweep::{convert_file, ConvertOptions, OutputFormat, UploadedFile};
//!
//! let file = UploadedFile::new("data.csv", std::fs::read("data.csv")?);
//! let options = ConvertOptions::new(OutputFormat::Spreadsheet);
//! let result = convert_file(&file, &options)?;
//! std::fs::write(&result.artifact.file_name, &result.artifact.bytes)?;
//! ```

use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::export::export;
use crate::models::{ConversionRequest, ExportArtifact, OutputFormat, Table, UploadedFile};
use crate::parser::{ingest, Ingested, ParseInfo};

use super::clean::{clean, CleanOptions, CleanReport};
use super::project::project_selection;

/// Options for a full conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Cleaning steps to apply
    pub clean: CleanOptions,
    /// Columns to keep, in order. `None` keeps all, an empty list keeps none.
    pub columns: Option<Vec<String>>,
    /// Target format
    pub format: OutputFormat,
}

impl ConvertOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            clean: CleanOptions::default(),
            columns: None,
            format,
        }
    }
}

/// Result of converting one file.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    pub source: String,
    pub info: ParseInfo,
    pub rows_in: usize,
    pub rows_out: usize,
    pub clean: CleanReport,
    pub table: Table,
    pub artifact: ExportArtifact,
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub file: String,
    pub result: Result<ConvertResult, PipelineError>,
}

/// Parse an upload and log what was read.
pub fn load_file(file: &UploadedFile) -> PipelineResult<Ingested> {
    log_info(format!("📖 Reading {} ({})", file.name, file.size_label()));

    let ingested = ingest(file).map_err(|e| {
        log_error(e.to_string());
        e
    })?;

    if let Some(ref encoding) = ingested.info.encoding {
        log_info_indent(format!("Encoding: {}", encoding), 1);
    }
    if let Some(delimiter) = ingested.info.delimiter {
        log_info_indent(format!("Delimiter: '{}'", format_delimiter(delimiter)), 1);
    }
    if let Some(ref sheet) = ingested.info.sheet {
        log_info_indent(format!("Worksheet: {}", sheet), 1);
    }
    log_success(format!(
        "Read {} rows × {} columns",
        ingested.table.row_count(),
        ingested.table.column_count()
    ));

    Ok(ingested)
}

/// Apply cleaning steps and log their effect.
pub fn clean_table(table: &mut Table, options: &CleanOptions) -> CleanReport {
    let report = clean(table, options);

    if let Some(removed) = report.duplicates_removed {
        log_success(format!("Duplicates removed: {}", removed));
    }
    if let Some(ref imputation) = report.imputation {
        for col in &imputation.filled {
            log_info_indent(
                format!("{}: {} cell(s) filled with mean {}", col.column, col.cells_filled, col.mean),
                1,
            );
        }
        for name in &imputation.skipped {
            log_warning(format!("{}: no values to average, left missing", name));
        }
        log_success(format!("Missing values filled: {}", imputation.total_filled()));
    }

    report
}

/// Run the whole pipeline for one file.
pub fn convert_file(file: &UploadedFile, options: &ConvertOptions) -> PipelineResult<ConvertResult> {
    let Ingested { mut table, info } = load_file(file)?;
    let rows_in = table.row_count();

    let clean_report = clean_table(&mut table, &options.clean);

    let projected = project_selection(&table, options.columns.as_deref())?;
    match options.columns.as_deref() {
        Some([]) => log_warning("No columns selected, output has no columns"),
        Some(columns) => log_info(format!("Selected columns: {}", columns.join(", "))),
        None => {}
    }

    let request = ConversionRequest::new(&file.name, options.format);
    let artifact = export(&projected, &request)?;
    log_success(format!(
        "🔄 {} → {} ({} bytes, {})",
        file.name,
        artifact.file_name,
        artifact.bytes.len(),
        options.format.label()
    ));

    Ok(ConvertResult {
        source: file.name.clone(),
        info,
        rows_in,
        rows_out: projected.row_count(),
        clean: clean_report,
        table: projected,
        artifact,
    })
}

/// Convert files one at a time, collecting each outcome.
pub fn convert_batch(files: &[UploadedFile], options: &ConvertOptions) -> Vec<FileOutcome> {
    let outcomes: Vec<FileOutcome> = files
        .iter()
        .map(|file| {
            let result = convert_file(file, options);
            if let Err(ref e) = result {
                log_error(format!("Skipping {}: {}", file.name, e));
            }
            FileOutcome {
                file: file.name.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed == 0 {
        log_success(format!("All {} file(s) processed", outcomes.len()));
    } else {
        log_warning(format!(
            "{} of {} file(s) failed",
            failed,
            outcomes.len()
        ));
    }

    outcomes
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::new(OutputFormat::Csv);
        assert!(!opts.clean.deduplicate);
        assert!(!opts.clean.impute);
        assert!(opts.columns.is_none());
    }

    #[test]
    fn test_convert_file_runs_all_stages() {
        let file = UploadedFile::new(
            "scores.csv",
            b"name,val,extra\na,1,x\na,1,x\nb,,y\nc,3,z\n".to_vec(),
        );
        let options = ConvertOptions {
            clean: CleanOptions {
                deduplicate: true,
                impute: true,
            },
            columns: Some(vec!["val".into(), "name".into()]),
            format: OutputFormat::Csv,
        };

        let result = convert_file(&file, &options).unwrap();
        assert_eq!(result.rows_in, 4);
        assert_eq!(result.rows_out, 3);
        assert_eq!(result.clean.duplicates_removed, Some(1));
        assert_eq!(result.table.column("val").unwrap().cells()[1], Cell::Number(2.0));
        assert_eq!(result.artifact.file_name, "scores.csv");
        assert_eq!(
            String::from_utf8(result.artifact.bytes).unwrap(),
            "val,name\n1,a\n2,b\n3,c\n"
        );
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let files = vec![
            UploadedFile::new("notes.txt", b"hello".to_vec()),
            UploadedFile::new("data.csv", b"a,b\n1,2\n".to_vec()),
        ];
        let outcomes = convert_batch(&files, &ConvertOptions::new(OutputFormat::Spreadsheet));

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            outcomes[0].result,
            Err(PipelineError::UnsupportedFormat { .. })
        ));
        let ok = outcomes[1].result.as_ref().unwrap();
        assert_eq!(ok.artifact.file_name, "data.xlsx");
    }

    #[test]
    fn test_unknown_column_produces_no_artifact() {
        let file = UploadedFile::new("data.csv", b"a,b\n1,2\n".to_vec());
        let mut options = ConvertOptions::new(OutputFormat::Csv);
        options.columns = Some(vec!["a".into(), "missing".into()]);

        assert!(matches!(
            convert_file(&file, &options),
            Err(PipelineError::UnknownColumn(cols)) if cols == vec!["missing".to_string()]
        ));
    }

    #[test]
    fn test_empty_selection_exports_no_columns() {
        let file = UploadedFile::new("data.csv", b"a,b\n1,2\n".to_vec());
        let mut options = ConvertOptions::new(OutputFormat::Csv);
        options.columns = Some(Vec::new());

        let result = convert_file(&file, &options).unwrap();
        assert_eq!(result.table.column_count(), 0);
        assert_eq!(result.rows_out, 1);
        assert!(result.artifact.bytes.is_empty());
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "TAB");
        assert_eq!(format_delimiter(';'), ";");
    }
}
