//! Per-check, per-case, and script health results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Round to four decimal places, the precision scores are reported at.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// `numerator / denominator`, or 1.0 when there is nothing to satisfy.
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// The rubric dimensions a case is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Sections,
    Assumptions,
    Keywords,
    References,
    Traits,
    PreferredScript,
}

impl CheckKind {
    /// Fixed weight of the dimension in the case score.
    pub fn weight(self) -> f64 {
        match self {
            CheckKind::Sections => 0.35,
            CheckKind::Assumptions => 0.10,
            CheckKind::Keywords => 0.20,
            CheckKind::References => 0.20,
            CheckKind::Traits => 0.10,
            CheckKind::PreferredScript => 0.05,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Sections => "sections",
            CheckKind::Assumptions => "assumptions",
            CheckKind::Keywords => "keywords",
            CheckKind::References => "references",
            CheckKind::Traits => "traits",
            CheckKind::PreferredScript => "preferred_script",
        }
    }
}

/// A named sub-score of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    /// Score in `[0, 1]`, rounded to four decimals.
    pub score: f64,
    pub passed: bool,
    /// Human-readable diagnostics.
    pub details: String,
}

impl CheckResult {
    pub fn new(
        name: impl Into<String>,
        score: f64,
        passed: bool,
        details: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            score: round4(score),
            passed,
            details: details.into(),
        }
    }
}

/// A failure that fails the case regardless of its weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardFailReason {
    MissingResponse,
    MissingRequiredSections,
    AssumptionsOutOfRange,
    PreferredScriptNumericMismatch,
}

impl HardFailReason {
    pub fn as_str(self) -> &'static str {
        match self {
            HardFailReason::MissingResponse => "missing_response",
            HardFailReason::MissingRequiredSections => "missing_required_sections",
            HardFailReason::AssumptionsOutOfRange => "assumptions_out_of_range",
            HardFailReason::PreferredScriptNumericMismatch => "preferred_script_numeric_mismatch",
        }
    }
}

impl fmt::Display for HardFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict for one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub id: String,
    pub title: String,
    pub category: String,
    /// Weighted score, rounded to four decimals.
    pub score: f64,
    pub passed: bool,
    /// Set only when the response is missing and missing responses are tolerated.
    pub skipped: bool,
    pub hard_fail_reasons: Vec<HardFailReason>,
    pub checks: Vec<CheckResult>,
}

impl CaseResult {
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// `PASS`, `FAIL`, or `SKIP`.
    pub fn status_label(&self) -> &'static str {
        if self.skipped {
            "SKIP"
        } else if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

/// Outcome of running one preferred script in the batch health-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptHealth {
    pub script: String,
    pub path: String,
    pub passed: bool,
    pub details: String,
}

/// Batch health-check over every distinct preferred script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptChecks {
    pub enabled: bool,
    pub score: f64,
    pub passed: bool,
    pub total: usize,
    pub passed_count: usize,
    pub results: Vec<ScriptHealth>,
}

impl ScriptChecks {
    /// Placeholder used when the health-check was not requested. It passes,
    /// so it never affects the overall verdict.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            score: 1.0,
            passed: true,
            total: 0,
            passed_count: 0,
            results: Vec::new(),
        }
    }

    pub fn from_results(results: Vec<ScriptHealth>) -> Self {
        let total = results.len();
        let passed_count = results.iter().filter(|r| r.passed).count();
        Self {
            enabled: true,
            score: round4(ratio(passed_count, total)),
            passed: passed_count == total,
            total,
            passed_count,
            results,
        }
    }
}
