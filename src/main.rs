use std::path::PathBuf;

use clap::Parser;
use task_ledger::classify::KeywordConfig;
use task_ledger::pipeline::{self, DEFAULT_PROCESSED_SUFFIX, ReconcileOptions};
use task_ledger::report::render_summary;
use task_ledger::{Result, ToolError};
use tracing_subscriber::EnvFilter;

const DEFAULT_TASKS_FILE: &str = "ZS-沪乍杭-线路任务单一览表-补定测.xlsx";
const DEFAULT_RETURNED_FILE: &str = "对应表格.xlsx";

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = cli.into_options()?;
    let analysis = pipeline::analyse_files(&options)?;

    print!("{}", render_summary(&analysis.report));

    let outputs = pipeline::write_outputs(&analysis, &options);
    for failure in &outputs.failures {
        eprintln!(
            "error: failed to write {} '{}': {}",
            failure.kind,
            failure.path.display(),
            failure.error
        );
    }

    if !outputs.written.is_empty() {
        println!();
    }
    for (kind, path) in &outputs.written {
        println!("{kind} written to {}", path.display());
    }
    Ok(())
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("task_ledger={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Report survey tasks that have not been returned yet."
)]
struct Cli {
    /// Task-definition workbook (one sheet per task group).
    #[arg(long = "tasks", alias = "zs", default_value = DEFAULT_TASKS_FILE)]
    tasks: PathBuf,

    /// Workbook listing already returned task codes.
    #[arg(long, default_value = DEFAULT_RETURNED_FILE)]
    returned: PathBuf,

    /// Write an Excel report (Category and CategoryDetail sheets) to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a PNG bar chart of outstanding tasks per category.
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Write the full report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// JSON file overriding the classification keywords.
    #[arg(long)]
    keywords: Option<PathBuf>,

    /// Suffix appended to the task workbook name for the processed copy.
    #[arg(long, default_value = DEFAULT_PROCESSED_SUFFIX)]
    suffix: String,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_options(self) -> Result<ReconcileOptions> {
        let keywords = match &self.keywords {
            Some(path) => KeywordConfig::load(path)?,
            None => KeywordConfig::default(),
        };

        let mut options = ReconcileOptions::new(self.tasks, self.returned);
        options.report = self.output;
        options.chart = self.chart;
        options.json = self.json;
        options.keywords = keywords;
        options.processed_suffix = self.suffix;
        Ok(options)
    }
}
