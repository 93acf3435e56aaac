//! Data Sweeper CLI - Convert and clean CSV / Excel files
//!
//! # Commands
//!
//! ```bash
//! datasweep serve                              # Start HTTP server (port 3000)
//! datasweep inspect data.csv book.xlsx         # Metadata + 5-row preview
//! datasweep convert data.csv --to xlsx         # data.csv → data.xlsx
//! datasweep convert *.csv --dedup --impute --columns name,total --out-dir out/
//! datasweep chart data.csv --column total      # Text bar chart
//! ```

use clap::{Parser, Subcommand};
use datasweep::{
    bar_chart, convert_batch, ingest, read_upload, CleanOptions, Config, ConvertOptions,
    OutputFormat, Table,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "datasweep")]
#[command(about = "Convert CSV and Excel files, with optional cleaning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: DATASWEEP_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show file metadata and the first rows of each file
    Inspect {
        /// Input files (.csv or .xlsx)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Number of preview rows
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Full pipeline: ingest → clean → select columns → export
    Convert {
        /// Input files (.csv or .xlsx)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Target format: csv or xlsx
        #[arg(short, long, default_value = "xlsx")]
        to: OutputFormat,

        /// Remove duplicate rows
        #[arg(long)]
        dedup: bool,

        /// Fill missing numeric values with the column mean
        #[arg(long)]
        impute: bool,

        /// Columns to keep, comma separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Print a bar chart of one numeric column
    Chart {
        /// Input file (.csv or .xlsx)
        input: PathBuf,

        /// Numeric column (default: third numeric column)
        #[arg(short, long)]
        column: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port).await,
        Commands::Inspect { inputs, rows } => cmd_inspect(&inputs, rows),
        Commands::Convert {
            inputs,
            to,
            dedup,
            impute,
            columns,
            out_dir,
        } => {
            let options = ConvertOptions {
                clean: CleanOptions {
                    deduplicate: dedup,
                    impute,
                },
                columns,
                format: to,
            };
            cmd_convert(&inputs, &options, out_dir.as_deref())
        }
        Commands::Chart { input, column } => cmd_chart(&input, column.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    datasweep::server::start_server(config).await
}

fn cmd_inspect(inputs: &[PathBuf], rows: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = 0;

    for input in inputs {
        let upload = match read_upload(input) {
            Ok(upload) => upload,
            Err(e) => {
                failed += 1;
                eprintln!("❌ {}: {}", input.display(), e);
                continue;
            }
        };
        println!("📄 {} ({})", upload.name, upload.size_label());

        match ingest(&upload) {
            Ok(ingested) => {
                let table = &ingested.table;
                println!(
                    "   {} rows × {} columns",
                    table.row_count(),
                    table.column_count()
                );
                for col in table.columns() {
                    println!(
                        "   - {} ({:?}, {} missing)",
                        col.name(),
                        col.kind(),
                        col.missing_count()
                    );
                }
                println!();
                print_table(&table.head(rows));
            }
            Err(e) => {
                failed += 1;
                eprintln!("❌ {}", e);
            }
        }
        println!();
    }

    if failed > 0 {
        return Err(format!("{} file(s) could not be read", failed).into());
    }
    Ok(())
}

fn cmd_convert(
    inputs: &[PathBuf],
    options: &ConvertOptions,
    out_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut uploads = Vec::new();
    let mut failed = 0;
    let mut sources = Vec::new();

    for input in inputs {
        match read_upload(input) {
            Ok(upload) => {
                sources.push(input.clone());
                uploads.push(upload);
            }
            Err(e) => {
                failed += 1;
                eprintln!("❌ {}: {}", input.display(), e);
            }
        }
    }

    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)?;
    }

    let outcomes = convert_batch(&uploads, options);
    for (outcome, source) in outcomes.into_iter().zip(sources) {
        match outcome.result {
            Ok(result) => {
                let dir = out_dir
                    .map(Path::to_path_buf)
                    .or_else(|| source.parent().map(Path::to_path_buf))
                    .unwrap_or_default();
                let path = dir.join(&result.artifact.file_name);
                fs::write(&path, &result.artifact.bytes)?;
                eprintln!(
                    "💾 {} → {} ({} rows)",
                    outcome.file,
                    path.display(),
                    result.rows_out
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("❌ {}", e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} file(s) failed", failed).into());
    }
    eprintln!("✨ All files have successfully been processed");
    Ok(())
}

fn cmd_chart(input: &Path, column: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let upload = read_upload(input)?;
    let ingested = ingest(&upload)?;
    let chart = bar_chart(&ingested.table, column)?;

    println!("📊 {}", chart.column);

    let width = 40.0;
    let scale = chart
        .max
        .map(|m| m.abs().max(chart.min.unwrap_or(0.0).abs()))
        .filter(|m| *m > 0.0)
        .unwrap_or(1.0);

    for bar in &chart.bars {
        match bar.value {
            Some(v) => {
                let len = ((v.abs() / scale) * width).round() as usize;
                println!("{:>5} | {} {}", bar.label, "█".repeat(len), v);
            }
            None => println!("{:>5} | (missing)", bar.label),
        }
    }
    Ok(())
}

/// Print a table as aligned text columns.
fn print_table(table: &Table) {
    let headers = table.column_names();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| c.to_text()).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("   {}", line(&headers));
    println!(
        "   {}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in &rows {
        println!("   {}", line(row));
    }
}
