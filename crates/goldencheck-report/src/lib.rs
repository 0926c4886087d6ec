//! goldencheck-report — Rendering and writing suite reports.
//!
//! Two formats are supported: a markdown document for humans and a pretty
//! JSON record for tooling.

pub mod json;
pub mod markdown;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use goldencheck_core::report::SuiteReport;

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unknown report format '{other}' (expected markdown or json)"
            )),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Markdown => f.write_str("markdown"),
            ReportFormat::Json => f.write_str("json"),
        }
    }
}

/// Render `report` in the requested format. The result ends with a newline.
pub fn render(report: &SuiteReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(markdown::render_markdown(report)),
        ReportFormat::Json => json::render_json(report),
    }
}

/// Render `report` and write it to `path`, creating parent directories.
pub fn write_report(report: &SuiteReport, format: ReportFormat, path: &Path) -> Result<()> {
    let rendered = render(report, format)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, rendered)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use goldencheck_core::report::{LintSummary, RunSettings, Summary, SuiteReport};
    use goldencheck_core::results::{
        CaseResult, CheckResult, HardFailReason, ScriptChecks, ScriptHealth,
    };

    pub fn sample_report() -> SuiteReport {
        SuiteReport {
            generated_at_utc: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            suite: "밸런스 디자이너".into(),
            version: "1.2".into(),
            suite_lint: LintSummary {
                passed: false,
                issues: vec!["case A03: missing 'prompt'".into()],
            },
            config: RunSettings {
                suite_path: "/repo/tests/golden/suite.json".into(),
                response_source: Some("/repo/responses".into()),
                min_case_score: 0.8,
                min_suite_score: 0.85,
                allow_missing_cases: true,
                check_scripts: true,
                case_ids: None,
            },
            cases: vec![
                CaseResult {
                    id: "A01".into(),
                    title: "TTK 계산".into(),
                    category: "combat".into(),
                    score: 1.0,
                    passed: true,
                    skipped: false,
                    hard_fail_reasons: vec![],
                    checks: vec![CheckResult::new(
                        "sections",
                        1.0,
                        true,
                        "all required sections present",
                    )],
                },
                CaseResult {
                    id: "A02".into(),
                    title: "Drop rates".into(),
                    category: "economy".into(),
                    score: 0.6125,
                    passed: false,
                    skipped: false,
                    hard_fail_reasons: vec![
                        HardFailReason::MissingRequiredSections,
                        HardFailReason::AssumptionsOutOfRange,
                    ],
                    checks: vec![
                        CheckResult::new("sections", 0.5, false, "missing: 가정"),
                        CheckResult::new("assumptions", 0.0, false, "count=5, max=3"),
                    ],
                },
                CaseResult {
                    id: "A03".into(),
                    title: "Skipped".into(),
                    category: "misc".into(),
                    score: 0.0,
                    passed: false,
                    skipped: true,
                    hard_fail_reasons: vec![],
                    checks: vec![CheckResult::new(
                        "response_presence",
                        0.0,
                        false,
                        "No response provided; skipped.",
                    )],
                },
            ],
            script_checks: ScriptChecks::from_results(vec![
                ScriptHealth {
                    script: "ttk_calc.py".into(),
                    path: "/repo/skills/game-balance-math/scripts/ttk_calc.py".into(),
                    passed: true,
                    details: "ok".into(),
                },
                ScriptHealth {
                    script: "drop_sim.py".into(),
                    path: "/repo/skills/game-balance-math/scripts/drop_sim.py".into(),
                    passed: false,
                    details: "file_not_found".into(),
                },
            ]),
            summary: Summary {
                cases_total: 3,
                cases_evaluated: 2,
                cases_passed: 1,
                suite_score: 0.8063,
                overall_passed: false,
            },
        }
    }
}
