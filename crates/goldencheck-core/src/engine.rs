//! Case scoring and suite aggregation.
//!
//! Every case is scored independently against its template and response,
//! one at a time. The only suspension points are reference computations,
//! which go through the engine's [`ScriptRunner`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::SubsecRound;

use crate::config::{DEFAULT_MIN_CASE_SCORE, DEFAULT_MIN_SUITE_SCORE};
use crate::inspector::inspect_traits;
use crate::model::{Case, CaseValidation, Template};
use crate::parser::{LoadedSuite, Responses};
use crate::reference::{check_script_health, evaluate_numeric_check, ScriptEnvironment};
use crate::report::{LintSummary, RunSettings, Summary, SuiteReport};
use crate::results::{
    ratio, round4, CaseResult, CheckKind, CheckResult, HardFailReason, ScriptChecks,
};
use crate::sections::{count_assumptions, find_missing_sections};
use crate::traits::ScriptRunner;

/// Configuration for the scoring engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub min_case_score: f64,
    pub min_suite_score: f64,
    /// Skip cases without a response instead of failing them.
    pub allow_missing_cases: bool,
    /// Run the batch health-check over every preferred script.
    pub check_scripts: bool,
    pub scripts: ScriptEnvironment,
}

impl EngineConfig {
    pub fn new(scripts: ScriptEnvironment) -> Self {
        Self {
            min_case_score: DEFAULT_MIN_CASE_SCORE,
            min_suite_score: DEFAULT_MIN_SUITE_SCORE,
            allow_missing_cases: false,
            check_scripts: false,
            scripts,
        }
    }
}

/// What to score in a run.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub suite: &'a LoadedSuite,
    pub responses: &'a Responses,
    /// Restrict scoring to these case ids.
    pub case_ids: Option<&'a [String]>,
    /// Where the responses came from, for the report.
    pub response_source: Option<&'a str>,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_case_start(&self, case_id: &str);
    fn on_case_complete(&self, result: &CaseResult);
    fn on_suite_complete(&self, summary: &Summary, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_case_start(&self, _: &str) {}
    fn on_case_complete(&self, _: &CaseResult) {}
    fn on_suite_complete(&self, _: &Summary, _: Duration) {}
}

/// The scoring engine.
pub struct Engine {
    runner: Arc<dyn ScriptRunner>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(runner: Arc<dyn ScriptRunner>, config: EngineConfig) -> Self {
        Self { runner, config }
    }

    /// Score one case against its template. `None` means the response is missing.
    pub async fn score_case(
        &self,
        case: &Case,
        template: &Template,
        response: Option<&str>,
    ) -> CaseResult {
        let id = if case.id.is_empty() {
            "UNKNOWN".to_string()
        } else {
            case.id.clone()
        };

        let Some(response) = response else {
            return self.missing_response(id, case);
        };
        let lower = response.to_lowercase();

        let missing_sections = find_missing_sections(response, &template.required_sections);
        let sections_score = ratio(
            template.required_sections.len() - missing_sections.len(),
            template.required_sections.len(),
        );
        let sections = CheckResult::new(
            CheckKind::Sections.name(),
            sections_score,
            missing_sections.is_empty(),
            missing_details(&missing_sections, "all required sections present"),
        );

        let assumption_count = count_assumptions(response);
        let assumptions_pass = assumption_count <= template.max_assumptions;
        let assumptions_score = if assumptions_pass { 1.0 } else { 0.0 };
        let assumptions = CheckResult::new(
            CheckKind::Assumptions.name(),
            assumptions_score,
            assumptions_pass,
            format!(
                "count={assumption_count}, max={}",
                template.max_assumptions
            ),
        );

        let (keywords_score, keywords) = containment_check(
            CheckKind::Keywords,
            &lower,
            &case.required_keywords,
            "all keywords present",
        );
        let (references_score, references) = containment_check(
            CheckKind::References,
            &lower,
            &case.required_references,
            "all references present",
        );

        let trait_outcome = inspect_traits(response, &template.required_traits);
        let traits = CheckResult::new(
            CheckKind::Traits.name(),
            trait_outcome.score,
            trait_outcome.missing.is_empty(),
            missing_details(&trait_outcome.missing, "all traits passed"),
        );

        // Unrounded scores feed the weighted sum; the checks carry rounded ones.
        let mut weighted = vec![
            (CheckKind::Sections, sections_score),
            (CheckKind::Assumptions, assumptions_score),
            (CheckKind::Keywords, keywords_score),
            (CheckKind::References, references_score),
            (CheckKind::Traits, trait_outcome.score),
        ];

        let mut hard_fail_reasons = Vec::new();
        if !sections.passed {
            hard_fail_reasons.push(HardFailReason::MissingRequiredSections);
        }
        if !assumptions_pass {
            hard_fail_reasons.push(HardFailReason::AssumptionsOutOfRange);
        }

        let mut checks = vec![sections, assumptions, keywords, references, traits];

        let preferred_script = case.preferred_script.as_deref().filter(|s| !s.is_empty());
        if let Some(script) = preferred_script {
            let check = match &case.script_validation {
                Some(CaseValidation::Descriptor(validation)) => {
                    let outcome = evaluate_numeric_check(
                        self.runner.as_ref(),
                        &self.config.scripts,
                        script,
                        validation,
                        response,
                    )
                    .await;
                    if !outcome.passed {
                        hard_fail_reasons.push(HardFailReason::PreferredScriptNumericMismatch);
                    }
                    weighted.push((CheckKind::PreferredScript, outcome.score));
                    CheckResult::new(
                        "preferred_script_numeric",
                        outcome.score,
                        outcome.passed,
                        outcome.details,
                    )
                }
                Some(CaseValidation::Malformed) => {
                    let (score, check) = mention_check("preferred_script_numeric", script, &lower);
                    if !check.passed {
                        hard_fail_reasons.push(HardFailReason::PreferredScriptNumericMismatch);
                    }
                    weighted.push((CheckKind::PreferredScript, score));
                    check
                }
                None => {
                    let (score, check) =
                        mention_check(CheckKind::PreferredScript.name(), script, &lower);
                    weighted.push((CheckKind::PreferredScript, score));
                    check
                }
            };
            checks.push(check);
        }

        let score = weighted_score(&weighted);
        let passed = score >= self.config.min_case_score && hard_fail_reasons.is_empty();

        for check in &checks {
            tracing::debug!(
                case = %id,
                check = %check.name,
                score = check.score,
                passed = check.passed,
                "{}",
                check.details
            );
        }

        CaseResult {
            id,
            title: case.title.clone(),
            category: case.category.clone(),
            score: round4(score),
            passed,
            skipped: false,
            hard_fail_reasons,
            checks,
        }
    }

    fn missing_response(&self, id: String, case: &Case) -> CaseResult {
        let skipped = self.config.allow_missing_cases;
        let (reasons, details) = if skipped {
            (vec![], "No response provided; skipped.")
        } else {
            (
                vec![HardFailReason::MissingResponse],
                "No response provided for this case.",
            )
        };
        CaseResult {
            id,
            title: case.title.clone(),
            category: case.category.clone(),
            score: 0.0,
            passed: false,
            skipped,
            hard_fail_reasons: reasons,
            checks: vec![CheckResult::new("response_presence", 0.0, false, details)],
        }
    }

    /// Score every selected case and aggregate the suite verdict.
    pub async fn run(
        &self,
        request: RunRequest<'_>,
        progress: &dyn ProgressReporter,
    ) -> SuiteReport {
        let start = Instant::now();
        let suite = &request.suite.suite;
        let selected = suite.select_cases(request.case_ids);
        tracing::info!(
            "scoring {} of {} cases in suite '{}'",
            selected.len(),
            suite.cases.len(),
            suite.name
        );

        let mut cases = Vec::with_capacity(selected.len());
        for case in selected {
            progress.on_case_start(&case.id);
            let template = suite.template_for(case);
            let response = request.responses.get(&case.id).map(String::as_str);
            let result = self.score_case(case, &template, response).await;
            tracing::debug!(
                case = %result.id,
                score = result.score,
                "{}",
                result.status_label()
            );
            progress.on_case_complete(&result);
            cases.push(result);
        }

        let script_checks = if self.config.check_scripts {
            let scripts = suite.preferred_scripts();
            tracing::info!("health-checking {} preferred scripts", scripts.len());
            check_script_health(self.runner.as_ref(), &self.config.scripts, &scripts).await
        } else {
            ScriptChecks::disabled()
        };

        let lint_passed = request.suite.lint_passed();
        let summary = summarize(&cases, lint_passed, &script_checks, self.config.min_suite_score);
        tracing::info!(
            evaluated = summary.cases_evaluated,
            passed = summary.cases_passed,
            suite_score = summary.suite_score,
            "overall {}",
            if summary.overall_passed { "PASS" } else { "FAIL" }
        );
        progress.on_suite_complete(&summary, start.elapsed());

        SuiteReport {
            generated_at_utc: chrono::Utc::now().trunc_subsecs(0),
            suite: suite.name.clone(),
            version: suite.version.clone(),
            suite_lint: LintSummary {
                passed: lint_passed,
                issues: request
                    .suite
                    .lint_issues
                    .iter()
                    .map(|i| i.to_string())
                    .collect(),
            },
            config: RunSettings {
                suite_path: request.suite.path.to_string_lossy().to_string(),
                response_source: request.response_source.map(str::to_string),
                min_case_score: self.config.min_case_score,
                min_suite_score: self.config.min_suite_score,
                allow_missing_cases: self.config.allow_missing_cases,
                check_scripts: self.config.check_scripts,
                case_ids: request.case_ids.map(<[String]>::to_vec),
            },
            cases,
            script_checks,
            summary,
        }
    }
}

/// Fold case results into the suite summary.
pub fn summarize(
    cases: &[CaseResult],
    lint_passed: bool,
    script_checks: &ScriptChecks,
    min_suite_score: f64,
) -> Summary {
    let evaluated: Vec<&CaseResult> = cases.iter().filter(|c| !c.skipped).collect();
    let cases_passed = evaluated.iter().filter(|c| c.passed).count();
    let suite_score = if evaluated.is_empty() {
        0.0
    } else {
        evaluated.iter().map(|c| c.score).sum::<f64>() / evaluated.len() as f64
    };

    let overall_passed = lint_passed
        && !evaluated.is_empty()
        && suite_score >= min_suite_score
        && cases_passed == evaluated.len()
        && script_checks.passed;

    Summary {
        cases_total: cases.len(),
        cases_evaluated: evaluated.len(),
        cases_passed,
        suite_score: round4(suite_score),
        overall_passed,
    }
}

/// `Σ weight·score / Σ weight` over the checks present.
pub fn weighted_score(scores: &[(CheckKind, f64)]) -> f64 {
    let (sum, total_weight) = scores
        .iter()
        .fold((0.0, 0.0), |(sum, total), (kind, score)| {
            (sum + kind.weight() * score, total + kind.weight())
        });
    if total_weight > 0.0 {
        sum / total_weight
    } else {
        0.0
    }
}

/// Case-insensitive containment of every required term. Returns the raw
/// ratio alongside the (rounded) check.
fn containment_check(
    kind: CheckKind,
    lower: &str,
    required: &[String],
    all_present: &str,
) -> (f64, CheckResult) {
    let missing: Vec<String> = required
        .iter()
        .filter(|term| !lower.contains(&term.to_lowercase()))
        .cloned()
        .collect();
    let score = ratio(required.len() - missing.len(), required.len());
    let check = CheckResult::new(
        kind.name(),
        score,
        missing.is_empty(),
        missing_details(&missing, all_present),
    );
    (score, check)
}

/// Whether the response names the preferred script.
fn mention_check(name: &str, script: &str, lower_response: &str) -> (f64, CheckResult) {
    let mentioned = lower_response.contains(&script.to_lowercase());
    let score = if mentioned { 1.0 } else { 0.0 };
    let details = if mentioned {
        format!("mentioned {script}")
    } else {
        format!("missing mention: {script}")
    };
    (score, CheckResult::new(name, score, mentioned, details))
}

fn missing_details(missing: &[String], all_present: &str) -> String {
    if missing.is_empty() {
        all_present.to_string()
    } else {
        format!("missing: {}", missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ScriptError;
    use crate::model::{ExtractEntry, ExtractRule, ScriptValidation, Suite};
    use crate::reference::DEFAULT_SCRIPT_TIMEOUT;
    use crate::traits::{ScriptOutput, ScriptRequest};

    struct StaticRunner {
        stdout: String,
        calls: Mutex<usize>,
    }

    impl StaticRunner {
        fn new(stdout: &str) -> Arc<Self> {
            Arc::new(Self {
                stdout: stdout.into(),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl ScriptRunner for StaticRunner {
        async fn run(&self, _request: &ScriptRequest) -> Result<ScriptOutput, ScriptError> {
            *self.calls.lock().unwrap() += 1;
            Ok(ScriptOutput {
                exit_code: 0,
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    fn env(dir: &std::path::Path) -> ScriptEnvironment {
        ScriptEnvironment {
            scripts_dir: dir.to_path_buf(),
            suite_dir: dir.to_path_buf(),
            interpreter: None,
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    fn engine(runner: Arc<dyn ScriptRunner>, scripts: ScriptEnvironment) -> Engine {
        Engine::new(runner, EngineConfig::new(scripts))
    }

    fn offline_engine() -> Engine {
        engine(StaticRunner::new("{}"), env(&PathBuf::from("/nonexistent")))
    }

    fn template(sections: &[&str], max_assumptions: usize) -> Template {
        Template {
            required_sections: sections.iter().map(|s| s.to_string()).collect(),
            max_assumptions,
            required_traits: vec![],
        }
    }

    const GOOD_RESPONSE: &str = "## Summary\nDPS is fine.\n\n## 가정\n- one\n- two\n";

    #[tokio::test]
    async fn well_formed_response_passes() {
        let case = Case {
            id: "A01".into(),
            required_keywords: vec!["dps".into()],
            ..Default::default()
        };
        let result = offline_engine()
            .score_case(&case, &template(&["Summary", "가정"], 2), Some(GOOD_RESPONSE))
            .await;
        assert!(result.passed, "{result:?}");
        assert_eq!(result.score, 1.0);
        assert_eq!(result.checks.len(), 5);
        assert_eq!(result.check("assumptions").unwrap().details, "count=2, max=2");
        assert_eq!(result.check("keywords").unwrap().details, "all keywords present");
    }

    #[tokio::test]
    async fn excess_assumptions_hard_fail() {
        let response = "## Summary\nok\n\n## 가정\n| # | 가정 |\n|---|---|\n| 1 | a |\n| 2 | b |\n| 3 | c |\n";
        let result = offline_engine()
            .score_case(
                &Case::default(),
                &template(&["Summary", "Assumptions"], 2),
                Some(response),
            )
            .await;
        assert!(!result.passed);
        assert_eq!(result.id, "UNKNOWN");
        assert!(result
            .hard_fail_reasons
            .contains(&HardFailReason::AssumptionsOutOfRange));
        let assumptions = result.check("assumptions").unwrap();
        assert!(!assumptions.passed);
        assert_eq!(assumptions.details, "count=3, max=2");
        assert_eq!(result.check("sections").unwrap().details, "missing: Assumptions");
    }

    #[tokio::test]
    async fn missing_response_fails_or_skips() {
        let case = Case {
            id: "A02".into(),
            ..Default::default()
        };
        let strict = offline_engine()
            .score_case(&case, &Template::default(), None)
            .await;
        assert!(!strict.passed && !strict.skipped);
        assert_eq!(strict.hard_fail_reasons, vec![HardFailReason::MissingResponse]);
        assert_eq!(strict.checks[0].name, "response_presence");

        let mut config = EngineConfig::new(env(&PathBuf::from("/nonexistent")));
        config.allow_missing_cases = true;
        let lenient = Engine::new(StaticRunner::new("{}"), config)
            .score_case(&case, &Template::default(), None)
            .await;
        assert!(lenient.skipped);
        assert!(lenient.hard_fail_reasons.is_empty());
        assert_eq!(lenient.checks[0].details, "No response provided; skipped.");
    }

    #[tokio::test]
    async fn script_mention_fallback_is_not_a_hard_fail() {
        let case = Case {
            preferred_script: Some("TTK_Calc.py".into()),
            ..Default::default()
        };
        let engine = offline_engine();
        let result = engine
            .score_case(&case, &Template::default(), Some("plain text"))
            .await;
        let check = result.check("preferred_script").unwrap();
        assert!(!check.passed);
        assert_eq!(check.details, "missing mention: TTK_Calc.py");
        assert!(result.hard_fail_reasons.is_empty());
        // 0.95 of the weight mass is satisfied, the script's 0.05 is not.
        assert_eq!(result.score, 0.95);
        assert!(result.passed);

        let result = engine
            .score_case(&case, &Template::default(), Some("see ttk_calc.py"))
            .await;
        assert_eq!(result.check("preferred_script").unwrap().details, "mentioned TTK_Calc.py");
    }

    #[tokio::test]
    async fn numeric_mismatch_fails_despite_high_score() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ttk.py"), "").unwrap();
        std::fs::write(dir.path().join("in.json"), "{}").unwrap();
        let runner = StaticRunner::new(r#"{"result": {"ttk": 12.0}}"#);
        let engine = engine(runner.clone(), env(dir.path()));

        let case = Case {
            id: "N01".into(),
            preferred_script: Some("ttk.py".into()),
            script_validation: Some(CaseValidation::Descriptor(ScriptValidation {
                input: "in.json".into(),
                extract: vec![ExtractRule {
                    path: "result.ttk".into(),
                    name: Some("ttk".into()),
                    atol: None,
                    rtol: None,
                }
                .into()],
                min_matches: None,
            })),
            ..Default::default()
        };

        let result = engine
            .score_case(&case, &Template::default(), Some("TTK is about 15s"))
            .await;
        assert!(result.score >= 0.80);
        assert!(!result.passed);
        assert_eq!(
            result.hard_fail_reasons,
            vec![HardFailReason::PreferredScriptNumericMismatch]
        );
        let check = result.check("preferred_script_numeric").unwrap();
        assert_eq!(check.details, "matched 0/1 (min 1); missing: ttk≈12±0.24");

        let result = engine
            .score_case(&case, &Template::default(), Some("TTK is about 12.1s"))
            .await;
        assert!(result.passed);
        assert_eq!(result.score, 1.0);
        assert_eq!(*runner.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn malformed_validation_falls_back_to_a_hard_mention_check() {
        let case = Case {
            preferred_script: Some("ttk.py".into()),
            script_validation: Some(CaseValidation::Malformed),
            ..Default::default()
        };
        let engine = offline_engine();

        let result = engine
            .score_case(&case, &Template::default(), Some("plain text"))
            .await;
        let check = result.check("preferred_script_numeric").unwrap();
        assert!(!check.passed);
        assert_eq!(check.details, "missing mention: ttk.py");
        assert_eq!(
            result.hard_fail_reasons,
            vec![HardFailReason::PreferredScriptNumericMismatch]
        );
        assert!(!result.passed);

        let result = engine
            .score_case(&case, &Template::default(), Some("ran TTK.py"))
            .await;
        assert!(result.passed);
        assert_eq!(result.check("preferred_script_numeric").unwrap().score, 1.0);
    }

    #[tokio::test]
    async fn invalid_extract_rule_is_scored_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ttk.py"), "").unwrap();
        std::fs::write(dir.path().join("in.json"), "{}").unwrap();
        let engine = engine(
            StaticRunner::new(r#"{"result": {"ttk": 12.0}}"#),
            env(dir.path()),
        );

        let case = Case {
            id: "N02".into(),
            preferred_script: Some("ttk.py".into()),
            script_validation: Some(CaseValidation::Descriptor(ScriptValidation {
                input: "in.json".into(),
                extract: vec![
                    ExtractEntry::Invalid,
                    ExtractRule {
                        path: "result.ttk".into(),
                        ..Default::default()
                    }
                    .into(),
                ],
                min_matches: Some(1),
            })),
            ..Default::default()
        };

        let result = engine
            .score_case(&case, &Template::default(), Some("TTK is 12s"))
            .await;
        assert!(result.passed, "{result:?}");
        let check = result.check("preferred_script_numeric").unwrap();
        assert_eq!(check.score, 0.5);
        assert_eq!(check.details, "matched 1/2 (min 1); missing: rule#1:invalid_rule");
    }

    #[test]
    fn weighted_score_does_not_renormalize() {
        let all_but_script = [
            (CheckKind::Sections, 1.0),
            (CheckKind::Assumptions, 1.0),
            (CheckKind::Keywords, 0.0),
            (CheckKind::References, 1.0),
            (CheckKind::Traits, 1.0),
        ];
        let score = weighted_score(&all_but_script);
        assert!((score - 0.75 / 0.95).abs() < 1e-12);
        assert_eq!(weighted_score(&[]), 0.0);
    }

    fn result(id: &str, score: f64, passed: bool, skipped: bool) -> CaseResult {
        CaseResult {
            id: id.into(),
            title: String::new(),
            category: String::new(),
            score,
            passed,
            skipped,
            hard_fail_reasons: vec![],
            checks: vec![],
        }
    }

    #[test]
    fn skipped_cases_leave_the_denominator() {
        let cases = vec![
            result("A", 0.9, true, false),
            result("B", 0.0, false, true),
            result("C", 0.95, true, false),
        ];
        let summary = summarize(&cases, true, &ScriptChecks::disabled(), 0.85);
        assert_eq!(summary.cases_total, 3);
        assert_eq!(summary.cases_evaluated, 2);
        assert_eq!(summary.cases_passed, 2);
        assert_eq!(summary.suite_score, 0.925);
        assert!(summary.overall_passed);

        assert!(!summarize(&cases, false, &ScriptChecks::disabled(), 0.85).overall_passed);
        let only_skipped = vec![result("B", 0.0, false, true)];
        let summary = summarize(&only_skipped, true, &ScriptChecks::disabled(), 0.0);
        assert_eq!(summary.suite_score, 0.0);
        assert!(!summary.overall_passed);
    }

    #[tokio::test]
    async fn run_is_idempotent_apart_from_timestamp() {
        let suite = Suite {
            name: "demo".into(),
            version: "1".into(),
            templates: [("t".to_string(), template(&["Summary"], 3))].into(),
            cases: vec![
                Case {
                    id: "A01".into(),
                    expected_template: "t".into(),
                    ..Default::default()
                },
                Case {
                    id: "A02".into(),
                    ..Default::default()
                },
            ],
        };
        let loaded = LoadedSuite {
            suite,
            lint_issues: vec![],
            path: PathBuf::from("/repo/golden/suite.json"),
        };
        let responses: Responses = [("A01".to_string(), "## Summary\nfine".to_string())].into();
        let ids = vec!["A01".to_string()];
        let request = RunRequest {
            suite: &loaded,
            responses: &responses,
            case_ids: Some(ids.as_slice()),
            response_source: Some("responses.json"),
        };

        let engine = offline_engine();
        let first = engine.run(request, &NoopReporter).await;
        let mut second = engine.run(request, &NoopReporter).await;
        assert_eq!(first.cases.len(), 1);
        assert!(first.summary.overall_passed);
        assert_eq!(first.config.case_ids, Some(ids.clone()));

        second.generated_at_utc = first.generated_at_utc;
        assert_eq!(first, second);
    }
}
