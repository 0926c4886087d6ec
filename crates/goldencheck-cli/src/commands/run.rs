//! The `goldencheck run` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use goldencheck_core::config::load_config_from;
use goldencheck_core::engine::{Engine, EngineConfig, ProgressReporter, RunRequest};
use goldencheck_core::parser::{self, LoadedSuite, Responses};
use goldencheck_core::reference::ScriptEnvironment;
use goldencheck_core::report::{Summary, SuiteReport};
use goldencheck_core::results::CaseResult;
use goldencheck_report::{render, write_report, ReportFormat};
use goldencheck_runner::ProcessRunner;

use super::{EXIT_FAIL, EXIT_PASS};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the .json or .toml suite
    #[arg(long)]
    pub suite: PathBuf,

    /// JSON file with responses keyed by case id
    #[arg(long, conflicts_with = "responses_dir")]
    pub responses: Option<PathBuf>,

    /// Directory with one <case-id>.md/.markdown/.txt file per case
    #[arg(long)]
    pub responses_dir: Option<PathBuf>,

    /// Only score these cases (comma-separated ids)
    #[arg(long)]
    pub case_ids: Option<String>,

    /// Minimum weighted score for a case to pass
    #[arg(long)]
    pub min_case_score: Option<f64>,

    /// Minimum mean case score for the suite to pass
    #[arg(long)]
    pub min_suite_score: Option<f64>,

    /// Skip cases without a response instead of failing them
    #[arg(long)]
    pub allow_missing_cases: bool,

    /// Health-check every preferred script once
    #[arg(long)]
    pub check_scripts: bool,

    /// Report format: markdown, json
    #[arg(long, default_value = "markdown")]
    pub format: ReportFormat,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory containing preferred scripts
    #[arg(long)]
    pub scripts_dir: Option<PathBuf>,

    /// Program used to launch scripts ("" runs them directly)
    #[arg(long)]
    pub interpreter: Option<String>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_case_start(&self, case_id: &str) {
        eprintln!("  Scoring: {case_id}");
    }

    fn on_case_complete(&self, result: &CaseResult) {
        eprintln!(
            "  Done: {} {} score={:.4}",
            result.id,
            result.status_label(),
            result.score
        );
    }

    fn on_suite_complete(&self, summary: &Summary, elapsed: Duration) {
        eprintln!(
            "\nComplete: {}/{} evaluated cases passed, suite score {:.4} ({:.1}s)",
            summary.cases_passed,
            summary.cases_evaluated,
            summary.suite_score,
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: RunArgs) -> Result<i32> {
    let config = load_config_from(args.config.as_deref())?;

    let suite_path = args
        .suite
        .canonicalize()
        .with_context(|| format!("suite file not found: {}", args.suite.display()))?;
    let loaded = parser::parse_suite(&suite_path)?;
    let case_ids = parser::parse_case_ids(args.case_ids.as_deref());

    let (responses, response_source) = load_responses(&args, &loaded, case_ids.as_deref())?;

    let scripts_dir = args
        .scripts_dir
        .clone()
        .unwrap_or_else(|| config.scripts.dir_for_suite(&suite_path));
    let interpreter = match &args.interpreter {
        Some(flag) => Some(flag.trim()).filter(|i| !i.is_empty()),
        None => config.scripts.interpreter(),
    };
    let scripts = ScriptEnvironment {
        scripts_dir,
        suite_dir: loaded.suite_dir().to_path_buf(),
        interpreter: interpreter.map(str::to_string),
        timeout: config.scripts.timeout(),
    };
    tracing::debug!(
        scripts_dir = %scripts.scripts_dir.display(),
        interpreter = ?scripts.interpreter,
        "resolved script environment"
    );

    let engine_config = EngineConfig {
        min_case_score: args.min_case_score.unwrap_or(config.min_case_score),
        min_suite_score: args.min_suite_score.unwrap_or(config.min_suite_score),
        allow_missing_cases: args.allow_missing_cases,
        check_scripts: args.check_scripts,
        scripts,
    };

    eprintln!(
        "goldencheck v{} — Scoring suite '{}' ({} cases)",
        env!("CARGO_PKG_VERSION"),
        loaded.suite.name,
        loaded.suite.cases.len()
    );
    eprintln!();

    let engine = Engine::new(Arc::new(ProcessRunner::new()), engine_config);
    let request = RunRequest {
        suite: &loaded,
        responses: &responses,
        case_ids: case_ids.as_deref(),
        response_source: response_source.as_deref(),
    };
    let report = engine.run(request, &ConsoleReporter).await;

    print_summary(&report);

    match &args.output {
        Some(path) => {
            write_report(&report, args.format, path)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => print!("{}", render(&report, args.format)?),
    }

    Ok(if report.summary.overall_passed {
        EXIT_PASS
    } else {
        EXIT_FAIL
    })
}

/// Load responses from whichever source was given. No source means every
/// case counts as missing.
fn load_responses(
    args: &RunArgs,
    loaded: &LoadedSuite,
    case_ids: Option<&[String]>,
) -> Result<(Responses, Option<String>)> {
    if let Some(file) = &args.responses {
        let path = absolute(file)?;
        let responses = parser::load_responses_from_file(&path)?;
        return Ok((responses, Some(path.to_string_lossy().to_string())));
    }

    if let Some(dir) = &args.responses_dir {
        let path = absolute(dir)?;
        let ids: Vec<&str> = loaded
            .suite
            .select_cases(case_ids)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        let responses = parser::load_responses_from_dir(&path, &ids)?;
        return Ok((responses, Some(path.to_string_lossy().to_string())));
    }

    Ok((Responses::new(), None))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("responses not found: {}", path.display()))
}

fn print_summary(report: &SuiteReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Case", "Score", "Result", "Hard Fail Reasons"]);

    for case in &report.cases {
        let reasons = if case.hard_fail_reasons.is_empty() {
            "-".to_string()
        } else {
            case.hard_fail_reasons
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            Cell::new(&case.id),
            Cell::new(format!("{:.4}", case.score)),
            Cell::new(case.status_label()),
            Cell::new(reasons),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Suite score: {:.4} (min {:.2}): {}",
        report.summary.suite_score,
        report.config.min_suite_score,
        if report.summary.overall_passed {
            "PASS"
        } else {
            "FAIL"
        }
    );
}
