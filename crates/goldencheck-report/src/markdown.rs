//! Markdown report document.

use chrono::SecondsFormat;

use goldencheck_core::report::SuiteReport;

fn pass_fail(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Render the report as a markdown document ending with a newline.
pub fn render_markdown(report: &SuiteReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        "# Golden Prompt Check Report".to_string(),
        String::new(),
        format!(
            "- Generated (UTC): {}",
            report
                .generated_at_utc
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!("- Suite: {} (version {})", report.suite, report.version),
        format!("- Suite lint: {}", pass_fail(report.suite_lint.passed)),
        format!(
            "- Cases passed: {}/{} (evaluated) / {} (total)",
            summary.cases_passed, summary.cases_evaluated, summary.cases_total
        ),
        format!("- Suite score: {:.4}", summary.suite_score),
        format!("- Overall: {}", pass_fail(summary.overall_passed)),
    ];

    if !report.suite_lint.issues.is_empty() {
        lines.push(String::new());
        lines.push("## Lint Issues".to_string());
        lines.extend(report.suite_lint.issues.iter().map(|i| format!("- {i}")));
    }

    lines.push(String::new());
    lines.push("## Case Results".to_string());
    lines.push("| Case | Score | Result | Hard Fail Reasons |".to_string());
    lines.push("|---|---:|---|---|".to_string());
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
        lines.push(format!(
            "| {} | {:.4} | {} | {} |",
            case.id,
            case.score,
            case.status_label(),
            reasons
        ));
    }

    let skipped: Vec<_> = report.skipped_cases().collect();
    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push("## Skipped Cases".to_string());
        lines.extend(skipped.iter().map(|c| format!("- {}", c.id)));
    }

    let failed: Vec<_> = report.failed_cases().collect();
    if !failed.is_empty() {
        lines.push(String::new());
        lines.push("## Failed Details".to_string());
        for case in failed {
            lines.push(format!("### {} - {}", case.id, case.title));
            for check in &case.checks {
                lines.push(format!(
                    "- [{}] {} score={:.4} ({})",
                    pass_fail(check.passed),
                    check.name,
                    check.score,
                    check.details
                ));
            }
        }
    }

    let scripts = &report.script_checks;
    if scripts.enabled {
        lines.push(String::new());
        lines.push("## Preferred Script Checks".to_string());
        lines.push(format!("- Passed: {}/{}", scripts.passed_count, scripts.total));
        lines.push(format!("- Score: {:.4}", scripts.score));
        lines.push(format!("- Status: {}", pass_fail(scripts.passed)));
        for item in &scripts.results {
            lines.push(format!(
                "- {} `{}`: {}",
                pass_fail(item.passed),
                item.script,
                item.details
            ));
        }
    }

    let mut doc = lines.join("\n");
    doc.push('\n');
    doc
}
