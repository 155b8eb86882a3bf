//! unsheet CLI - XLSX worksheet extraction to CSV
//!
//! A command-line tool for converting the first worksheet of XLSX files
//! into normalized CSV tables.

mod logger;

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use unsheet::render::ConvertOptions;
use unsheet::xlsx::{column_label, XlsxReader};
use unsheet::{BatchReport, DateColumns, FileStatus};

/// XLSX worksheet extraction to normalized CSV
#[derive(Parser)]
#[command(
    name = "unsheet",
    author = "iyulab",
    version,
    about = "Convert XLSX worksheets to CSV",
    long_about = "unsheet - Minimal XLSX worksheet extraction tool.\n\n\
                  Reads the first worksheet of each workbook, normalizes serial dates \
                  and numbers, and writes a CSV table next to it."
)]
struct Cli {
    /// Show debug output on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert workbooks to CSV
    Convert {
        /// Input XLSX files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column holding serial dates (repeatable)
        #[arg(short = 'd', long = "date-column")]
        date_columns: Vec<String>,

        /// Do not treat `fecha` and `fecha_alta` as date columns
        #[arg(long)]
        no_default_dates: bool,

        /// Field delimiter
        #[arg(long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,

        /// Print a JSON report instead of per-file lines
        #[arg(long)]
        json: bool,
    },

    /// Show workbook structure and header columns
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(*b),
        _ => match value {
            "\\t" | "tab" => Ok(b'\t'),
            _ => Err(format!("delimiter must be a single ASCII character, got {:?}", value)),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when some input failed to convert.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Convert {
            inputs,
            output,
            date_columns,
            no_default_dates,
            delimiter,
            json,
        } => {
            let mut dates = if no_default_dates {
                DateColumns::empty()
            } else {
                DateColumns::default()
            };
            for column in date_columns {
                dates.insert(column);
            }

            let mut options = ConvertOptions::new()
                .with_date_columns(dates)
                .with_delimiter(delimiter);
            if let Some(dir) = output {
                std::fs::create_dir_all(&dir)?;
                options = options.with_output_dir(dir);
            }

            let pb = create_spinner(&format!("Converting {} workbook(s)...", inputs.len()));
            let report = unsheet::convert_files(&inputs, &options);
            pb.finish_and_clear();

            if json {
                println!("{}", report.to_json(true)?);
            } else {
                print_report(&report);
            }

            Ok(report.all_succeeded())
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing workbook...");
            let reader = XlsxReader::open(&input)?;
            let rows = reader.rows()?;
            pb.finish_and_clear();

            println!("{}", "Workbook Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            if let Some(name) = reader.sheet_name() {
                println!("{}: {}", "Sheet".bold(), name);
            }
            println!("{}: {}", "Worksheet part".bold(), reader.worksheet_path());
            println!(
                "{}: {}",
                "Shared strings".bold(),
                reader.shared_strings().len()
            );
            println!(
                "{}: {}",
                "Data rows".bold(),
                rows.len().saturating_sub(1)
            );

            println!("\n{}", "Parts".cyan().bold());
            println!("{}", "─".repeat(40));
            for part in reader.package().list_files() {
                println!("  {}", part);
            }

            if let Some(header) = rows.first() {
                let dates = DateColumns::default();
                println!("\n{}", "Columns".cyan().bold());
                println!("{}", "─".repeat(40));
                for (idx, name) in header.iter().enumerate() {
                    let marker = if dates.contains(name) { " (date)" } else { "" };
                    println!("  {:>3}  {}{}", column_label(idx), name, marker.dimmed());
                }
            }

            Ok(true)
        }

        Commands::Version => {
            print_version();
            Ok(true)
        }
    }
}

fn print_report(report: &BatchReport) {
    for file in &report.files {
        match &file.status {
            FileStatus::Converted { output, rows } => println!(
                "{} {} -> {} ({} rows)",
                "✓".green().bold(),
                file.input.display(),
                output.display(),
                rows
            ),
            FileStatus::Empty => println!(
                "{} {}: worksheet is empty, nothing written",
                "!".yellow().bold(),
                file.input.display()
            ),
            FileStatus::Failed { kind, message } => println!(
                "{} {}: {} ({:?})",
                "✗".red().bold(),
                file.input.display(),
                message,
                kind
            ),
        }
    }

    if report.files.len() > 1 {
        println!(
            "\n{} converted, {} failed",
            report.succeeded().to_string().green(),
            report.failed().to_string().red()
        );
    }
}

fn print_version() {
    println!("{} {}", "unsheet".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Minimal XLSX worksheet extraction to normalized CSV");
    println!();
    println!("Repository: https://github.com/iyulab/unsheet");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
