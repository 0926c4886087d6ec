//! Suite report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::results::{CaseResult, ScriptChecks};

/// A complete scoring report for one run over a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// When the report was generated, at whole-second precision.
    pub generated_at_utc: DateTime<Utc>,
    /// Suite name.
    pub suite: String,
    /// Suite version.
    pub version: String,
    pub suite_lint: LintSummary,
    /// The settings the run used.
    pub config: RunSettings,
    /// Per-case results, in suite order.
    pub cases: Vec<CaseResult>,
    /// Batch health-check results (a passing placeholder when disabled).
    pub script_checks: ScriptChecks,
    pub summary: Summary,
}

/// Lint outcome for the suite document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintSummary {
    pub passed: bool,
    pub issues: Vec<String>,
}

/// Settings echoed into the report so it can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub suite_path: String,
    /// Responses file or directory; `None` when no source was given.
    pub response_source: Option<String>,
    pub min_case_score: f64,
    pub min_suite_score: f64,
    pub allow_missing_cases: bool,
    pub check_scripts: bool,
    /// Explicit case selection, if any.
    pub case_ids: Option<Vec<String>>,
}

/// Aggregate counts and the overall verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub cases_total: usize,
    /// Cases that were not skipped.
    pub cases_evaluated: usize,
    pub cases_passed: usize,
    /// Mean score of evaluated cases, rounded to four decimals.
    pub suite_score: f64,
    pub overall_passed: bool,
}

impl SuiteReport {
    pub fn skipped_cases(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| c.skipped)
    }

    /// Evaluated cases that did not pass.
    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| !c.skipped && !c.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::results::HardFailReason;

    fn case(id: &str, passed: bool, skipped: bool) -> CaseResult {
        CaseResult {
            id: id.into(),
            title: String::new(),
            category: String::new(),
            score: if passed { 1.0 } else { 0.0 },
            passed,
            skipped,
            hard_fail_reasons: if passed || skipped {
                vec![]
            } else {
                vec![HardFailReason::MissingResponse]
            },
            checks: vec![],
        }
    }

    fn sample() -> SuiteReport {
        SuiteReport {
            generated_at_utc: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            suite: "demo".into(),
            version: "1".into(),
            suite_lint: LintSummary {
                passed: true,
                issues: vec![],
            },
            config: RunSettings {
                suite_path: "/repo/suite.json".into(),
                response_source: None,
                min_case_score: 0.8,
                min_suite_score: 0.85,
                allow_missing_cases: true,
                check_scripts: false,
                case_ids: None,
            },
            cases: vec![case("A", true, false), case("B", false, false), case("C", false, true)],
            script_checks: ScriptChecks::disabled(),
            summary: Summary {
                cases_total: 3,
                cases_evaluated: 2,
                cases_passed: 1,
                suite_score: 0.5,
                overall_passed: false,
            },
        }
    }

    #[test]
    fn filters_failed_and_skipped() {
        let report = sample();
        let failed: Vec<_> = report.failed_cases().map(|c| c.id.as_str()).collect();
        let skipped: Vec<_> = report.skipped_cases().map(|c| c.id.as_str()).collect();
        assert_eq!(failed, vec!["B"]);
        assert_eq!(skipped, vec!["C"]);
    }

    #[test]
    fn serializes_with_report_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["generated_at_utc"], "2026-01-02T03:04:05Z");
        assert_eq!(json["summary"]["cases_evaluated"], 2);
        assert_eq!(json["config"]["response_source"], serde_json::Value::Null);
        assert_eq!(json["cases"][1]["hard_fail_reasons"][0], "missing_response");
        assert_eq!(json["script_checks"]["enabled"], false);

        let back: SuiteReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
