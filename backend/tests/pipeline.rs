//! End-to-end pipeline tests through the public API.

use datasweep::{
    bar_chart, convert_batch, convert_file, ingest, project, CleanOptions, Command,
    CommandOutput, ConvertOptions, OutputFormat, PipelineError, Session, UploadedFile,
};
use datasweep::{Cell, ColumnType};

fn csv(name: &str, content: &str) -> UploadedFile {
    UploadedFile::new(name, content.as_bytes().to_vec())
}

fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_dedup_keeps_first_occurrences() {
    let file = csv("people.csv", "name,n\na,1\na,1\nb,2\n");
    let mut options = ConvertOptions::new(OutputFormat::Csv);
    options.clean = CleanOptions {
        deduplicate: true,
        impute: false,
    };

    let result = convert_file(&file, &options).unwrap();

    assert_eq!(result.rows_in, 3);
    assert_eq!(result.rows_out, 2);
    assert_eq!(result.clean.duplicates_removed, Some(1));
    assert_eq!(
        String::from_utf8(result.artifact.bytes).unwrap(),
        "name,n\na,1\nb,2\n"
    );
}

#[test]
fn test_impute_fills_column_mean() {
    let file = csv("vals.csv", "val\n1\nNA\n3\n");
    let mut options = ConvertOptions::new(OutputFormat::Csv);
    options.clean.impute = true;

    let result = convert_file(&file, &options).unwrap();

    let col = result.table.column("val").unwrap();
    assert_eq!(col.kind(), ColumnType::Numeric);
    assert_eq!(
        col.cells(),
        &[Cell::Int(1), Cell::Number(2.0), Cell::Int(3)]
    );
    assert_eq!(
        String::from_utf8(result.artifact.bytes).unwrap(),
        "val\n1\n2\n3\n"
    );
}

#[test]
fn test_csv_to_spreadsheet_naming() {
    let file = csv("data.csv", "a,b\n1,x\n2,y\n");
    let result = convert_file(&file, &ConvertOptions::new(OutputFormat::Spreadsheet)).unwrap();

    assert_eq!(result.artifact.file_name, "data.xlsx");
    assert_eq!(
        result.artifact.mime_type,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    // xlsx is a zip container
    assert_eq!(&result.artifact.bytes[..2], b"PK");

    let back = ingest(&UploadedFile::new("data.xlsx", result.artifact.bytes)).unwrap();
    assert_eq!(back.table.column_names(), cells(&["a", "b"]));
    assert_eq!(back.table.row_count(), 2);
    assert_eq!(back.table.column("a").unwrap().kind(), ColumnType::Numeric);
}

#[test]
fn test_unsupported_file_does_not_stop_batch() {
    let files = vec![
        csv("notes.txt", "hello"),
        csv("good.csv", "a\n1\n"),
    ];
    let outcomes = convert_batch(&files, &ConvertOptions::new(OutputFormat::Csv));

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].result,
        Err(PipelineError::UnsupportedFormat { ref extension, .. }) if extension == ".txt"
    ));
    let good = outcomes[1].result.as_ref().unwrap();
    assert_eq!(good.artifact.file_name, "good.csv");
}

#[test]
fn test_unknown_column_produces_no_artifact() {
    let file = csv("t.csv", "a,b\n1,2\n");
    let mut options = ConvertOptions::new(OutputFormat::Csv);
    options.columns = Some(cells(&["a", "zzz"]));

    match convert_file(&file, &options) {
        Err(PipelineError::UnknownColumn(missing)) => assert_eq!(missing, cells(&["zzz"])),
        other => panic!("expected UnknownColumn, got {:?}", other.map(|r| r.artifact.file_name)),
    }
}

#[test]
fn test_csv_round_trip() {
    let content = "city,temp,note\nParis,12.5,\"mild, wet\"\nOslo,-3,\nRome,20,sunny\n";
    let first = ingest(&csv("w.csv", content)).unwrap().table;

    let result = convert_file(&csv("w.csv", content), &ConvertOptions::new(OutputFormat::Csv))
        .unwrap();
    let second = ingest(&UploadedFile::new("w.csv", result.artifact.bytes))
        .unwrap()
        .table;

    assert_eq!(first, second);
}

#[test]
fn test_long_ids_convert_unchanged() {
    let content = "id,name\n9007199254740993,a\n1234567890123456789,b\n";
    let result = convert_file(&csv("ids.csv", content), &ConvertOptions::new(OutputFormat::Csv))
        .unwrap();

    assert_eq!(result.table.column("id").unwrap().kind(), ColumnType::Numeric);
    assert_eq!(String::from_utf8(result.artifact.bytes).unwrap(), content);
}

#[test]
fn test_projection_keeps_rows_in_order() {
    let table = ingest(&csv("t.csv", "a,b,c\n1,x,4\n2,y,5\n3,z,6\n"))
        .unwrap()
        .table;

    let projected = project(&table, &cells(&["c", "a"])).unwrap();

    assert_eq!(projected.column_names(), cells(&["c", "a"]));
    assert_eq!(projected.row_count(), table.row_count());
    assert_eq!(
        projected.column("a").unwrap().cells(),
        table.column("a").unwrap().cells()
    );
}

#[test]
fn test_semicolon_latin1_upload() {
    // "café" in Latin-1
    let mut bytes = b"name;price\ncaf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b";2,5\nthe;3\n");

    let ingested = ingest(&UploadedFile::new("menu.csv", bytes)).unwrap();

    assert_eq!(ingested.info.delimiter, Some(';'));
    assert_eq!(ingested.table.column_count(), 2);
    assert_eq!(ingested.table.row_count(), 2);
    match &ingested.table.column("name").unwrap().cells()[0] {
        Cell::Text(s) => assert!(s.starts_with("caf")),
        other => panic!("expected text, got {:?}", other),
    }
    // Decimal comma is not a number
    assert_eq!(ingested.table.column("price").unwrap().kind(), ColumnType::Text);
}

#[test]
fn test_session_commands() {
    let mut session = Session::new();
    let id = session
        .add_upload(csv("s.csv", "a,b,c,d\n1,2,3,x\n1,2,3,x\n4,,6,y\n"))
        .unwrap();

    let out = session.execute(&id, Command::Deduplicate).unwrap();
    assert!(matches!(out, CommandOutput::Cleaned(ref r) if r.duplicates_removed == Some(1)));

    let out = session.execute(&id, Command::Impute).unwrap();
    match out {
        CommandOutput::Cleaned(report) => {
            assert_eq!(report.imputation.unwrap().total_filled(), 1)
        }
        _ => panic!("expected cleaning report"),
    }

    session
        .execute(
            &id,
            Command::Project {
                columns: Some(cells(&["d", "a"])),
            },
        )
        .unwrap();

    let out = session
        .execute(
            &id,
            Command::Export {
                format: OutputFormat::Csv,
            },
        )
        .unwrap();
    match out {
        CommandOutput::Artifact(artifact) => {
            assert_eq!(artifact.file_name, "s.csv");
            assert_eq!(String::from_utf8(artifact.bytes).unwrap(), "d,a\nx,1\ny,4\n");
        }
        _ => panic!("expected artifact"),
    }
}

#[test]
fn test_chart_default_column() {
    let table = ingest(&csv("c.csv", "a,b,label,c\n1,2,x,3\n4,5,y,6\n"))
        .unwrap()
        .table;

    let chart = bar_chart(&table, None).unwrap();
    assert_eq!(chart.column, "c");
    assert_eq!(chart.max, Some(6.0));

    let two = ingest(&csv("c.csv", "a,b\n1,2\n")).unwrap().table;
    assert!(bar_chart(&two, None).is_err());
}
