//! Enrolclean CLI - Clean and summarise enrolment spreadsheets
//!
//! # Main Commands
//!
//! ```bash
//! enrolclean clean --input raw/            # Write cleaned table + quality report
//! enrolclean aggregate                     # Summaries from the cleaned table
//! enrolclean run --input raw/              # clean, then aggregate
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! enrolclean inspect raw/jan.xlsx          # Show the tables one file yields
//! enrolclean aliases                       # Show the header alias table
//! ```

use clap::{Args, Parser, Subcommand};
use enrolclean::logs::{init_tracing, log_error, log_info};
use enrolclean::transform::schema::canonical_name;
use enrolclean::{
    load_source, run_aggregate, run_all, run_clean, AggregateConfig, AliasTable, PipelineConfig,
};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "enrolclean")]
#[command(about = "Clean, deduplicate and summarise enrolment spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean every spreadsheet under the input directory
    Clean {
        #[command(flatten)]
        clean: CleanArgs,
    },

    /// Summarise a cleaned table
    Aggregate {
        /// Cleaned CSV (default: ./cleaned/enrolment_cleaned.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for the summary files
        #[arg(short, long)]
        summary_dir: Option<PathBuf>,
    },

    /// Clean, then summarise the result
    Run {
        #[command(flatten)]
        clean: CleanArgs,

        /// Directory for the summary files
        #[arg(long)]
        summary_dir: Option<PathBuf>,
    },

    /// Load one file and print its tables as JSON
    Inspect {
        /// Spreadsheet or CSV file
        input: PathBuf,

        /// Sample rows printed per table
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Print the header alias table
    Aliases,
}

#[derive(Args)]
struct CleanArgs {
    /// Directory scanned recursively for spreadsheets
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for the cleaned table and report (default: <input>/cleaned)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also read .csv files
    #[arg(long)]
    include_csv: bool,

    /// Omit the source_file / source_sheet columns
    #[arg(long)]
    no_provenance: bool,

    /// Text written for missing values
    #[arg(long)]
    missing_marker: Option<String>,
}

impl CleanArgs {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if let Some(input) = self.input {
            config = config.with_input_dir(input);
        }
        if let Some(output) = self.output {
            config = config.with_output_dir(output);
        }
        if self.include_csv {
            config = config.with_csv();
        }
        if self.no_provenance {
            config.include_provenance = false;
        }
        if let Some(marker) = self.missing_marker {
            config.missing_marker = marker;
        }
        config
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_tracing("info");

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean { clean } => cmd_clean(clean.into_config()),

        Commands::Aggregate { input, summary_dir } => {
            cmd_aggregate(input.as_deref(), summary_dir.as_deref())
        }

        Commands::Run { clean, summary_dir } => cmd_run(clean.into_config(), summary_dir.as_deref()),

        Commands::Inspect { input, rows } => cmd_inspect(&input, rows),

        Commands::Aliases => cmd_aliases(),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_clean(config: PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_clean(&config)?;
    println!("{}", result.cleaned_path.display());
    Ok(())
}

fn cmd_aggregate(input: Option<&Path>, summary_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AggregateConfig::for_pipeline(&PipelineConfig::from_env());
    if let Some(input) = input {
        config.cleaned_path = input.to_path_buf();
    }
    if let Some(dir) = summary_dir {
        config.summary_dir = dir.to_path_buf();
    }

    run_aggregate(&config)?;
    Ok(())
}

fn cmd_run(config: PipelineConfig, summary_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut aggregate = AggregateConfig::for_pipeline(&config);
    if let Some(dir) = summary_dir {
        aggregate.summary_dir = dir.to_path_buf();
    }

    let (cleaned, _) = run_all(&config, &aggregate)?;
    log_info(format!(
        "Done: {} rows cleaned, summaries in {}",
        cleaned.reconciled.report.rows_final(),
        aggregate.summary_dir.display()
    ));
    Ok(())
}

fn cmd_inspect(input: &Path, sample_rows: usize) -> Result<(), Box<dyn std::error::Error>> {
    let aliases = AliasTable::default();
    let tables = load_source(input)?;

    let report: Vec<_> = tables
        .iter()
        .map(|table| {
            let normalized: Vec<String> =
                table.headers.iter().map(|h| canonical_name(h, &aliases)).collect();
            let sample: Vec<Vec<Option<String>>> = table
                .rows
                .iter()
                .take(sample_rows)
                .map(|row| row.iter().map(|cell| cell.as_text()).collect())
                .collect();
            json!({
                "source": table.provenance.to_string(),
                "sheet": table.provenance.sheet,
                "rows": table.len(),
                "headers": table.headers,
                "normalized_headers": normalized,
                "sample": sample,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_aliases() -> Result<(), Box<dyn std::error::Error>> {
    let aliases = AliasTable::default();
    for (from, to) in aliases.iter() {
        println!("{:<16} -> {}", from, to);
    }
    Ok(())
}
