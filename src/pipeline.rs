use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::classify::{Classifier, KeywordConfig};
use crate::error::{Result, ToolError};
use crate::extract::extract_tasks;
use crate::io::{chart, excel_read, excel_write};
use crate::model::{TaskRecord, WorkbookSnapshot};
use crate::reconcile::{Report, mark_returned, reconcile};
use crate::report::build_report_workbook;
use crate::returned::ReturnedSet;

/// Suffix appended to the task workbook's base name for the processed copy.
pub const DEFAULT_PROCESSED_SUFFIX: &str = "_processed";

/// Everything a reconciliation run needs to know.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub tasks: PathBuf,
    pub returned: PathBuf,
    pub report: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub keywords: KeywordConfig,
    pub processed_suffix: String,
}

impl ReconcileOptions {
    pub fn new(tasks: impl Into<PathBuf>, returned: impl Into<PathBuf>) -> Self {
        Self {
            tasks: tasks.into(),
            returned: returned.into(),
            report: None,
            chart: None,
            json: None,
            keywords: KeywordConfig::default(),
            processed_suffix: DEFAULT_PROCESSED_SUFFIX.to_string(),
        }
    }

    /// Path of the processed copy of the task workbook.
    pub fn processed_path(&self) -> PathBuf {
        processed_path(&self.tasks, &self.processed_suffix)
    }
}

/// Result of the input stage: the loaded task workbook, the reconciled
/// records and the aggregated report.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub source: WorkbookSnapshot,
    pub records: Vec<TaskRecord>,
    pub report: Report,
}

/// Kind of output produced by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    ProcessedCopy,
    Report,
    Chart,
    Json,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::ProcessedCopy => write!(f, "processed copy"),
            OutputKind::Report => write!(f, "report"),
            OutputKind::Chart => write!(f, "chart"),
            OutputKind::Json => write!(f, "JSON report"),
        }
    }
}

/// An output that could not be written. The run itself still succeeds.
#[derive(Debug)]
pub struct OutputFailure {
    pub kind: OutputKind,
    pub path: PathBuf,
    pub error: ToolError,
}

/// What [`write_outputs`] managed to write, and what it did not.
#[derive(Debug, Default)]
pub struct OutputSummary {
    pub written: Vec<(OutputKind, PathBuf)>,
    pub failures: Vec<OutputFailure>,
}

/// Reads both workbooks and reconciles them. Any failure here is fatal.
#[instrument(
    level = "info",
    skip_all,
    fields(tasks = %options.tasks.display(), returned = %options.returned.display())
)]
pub fn analyse_files(options: &ReconcileOptions) -> Result<Analysis> {
    let classifier = Classifier::new(&options.keywords)?;
    let source = excel_read::read_workbook(&options.tasks)?;
    let returned = excel_read::read_workbook(&options.returned)?;
    Ok(analyse(source, &returned, &classifier))
}

/// Pure reconciliation over already loaded workbooks.
pub fn analyse(
    source: WorkbookSnapshot,
    returned: &WorkbookSnapshot,
    classifier: &Classifier,
) -> Analysis {
    let returned_set = ReturnedSet::from_workbook(returned);
    let records = classifier.classify_records(extract_tasks(&source));
    let records = reconcile(records, &returned_set);
    let report = Report::from_records(&records);
    Analysis {
        source,
        records,
        report,
    }
}

/// Writes the processed copy and any requested outputs. Each output is
/// attempted independently; failures are logged and returned.
#[instrument(level = "info", skip_all)]
pub fn write_outputs(analysis: &Analysis, options: &ReconcileOptions) -> OutputSummary {
    let inputs = [options.tasks.as_path(), options.returned.as_path()];
    let mut outputs = OutputSummary::default();

    let processed = options.processed_path();
    attempt(&mut outputs, OutputKind::ProcessedCopy, &processed, &inputs, |path| {
        let marked = mark_returned(&analysis.source, &analysis.records);
        excel_write::write_snapshot(path, &marked)
    });

    if let Some(path) = &options.report {
        attempt(&mut outputs, OutputKind::Report, path, &inputs, |path| {
            let workbook = build_report_workbook(&analysis.report, &analysis.records);
            excel_write::write_workbook(path, &workbook)
        });
    }

    if let Some(path) = &options.chart {
        attempt(&mut outputs, OutputKind::Chart, path, &inputs, |path| {
            chart::write_outstanding_chart(path, &analysis.report)
        });
    }

    if let Some(path) = &options.json {
        attempt(&mut outputs, OutputKind::Json, path, &inputs, |path| {
            let json = serde_json::to_string_pretty(&analysis.report)?;
            fs::write(path, json)?;
            Ok(())
        });
    }

    outputs
}

/// Derives `<stem><suffix>.xlsx` next to the original workbook.
pub fn processed_path(original: &Path, suffix: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tasks".to_string());
    original.with_file_name(format!("{stem}{suffix}.xlsx"))
}

fn attempt<F>(
    outputs: &mut OutputSummary,
    kind: OutputKind,
    path: &Path,
    inputs: &[&Path],
    write: F,
) where
    F: FnOnce(&Path) -> Result<()>,
{
    let outcome = ensure_not_input(path, inputs).and_then(|()| write(path));
    match outcome {
        Ok(()) => {
            info!(%kind, path = %path.display(), "output written");
            outputs.written.push((kind, path.to_path_buf()));
        }
        Err(err) => {
            error!(%kind, path = %path.display(), error = %err, "failed to write output");
            outputs.failures.push(OutputFailure {
                kind,
                path: path.to_path_buf(),
                error: err,
            });
        }
    }
}

fn ensure_not_input(path: &Path, inputs: &[&Path]) -> Result<()> {
    let candidate = comparable(path);
    if inputs.iter().any(|input| comparable(input) == candidate) {
        return Err(ToolError::WouldOverwriteInput(path.to_path_buf()));
    }
    Ok(())
}

fn comparable(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
