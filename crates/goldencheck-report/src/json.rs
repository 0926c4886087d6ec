//! JSON report record.

use anyhow::{Context, Result};

use goldencheck_core::report::SuiteReport;

/// Pretty-print the report (two-space indent, UTF-8 kept as is) with a trailing newline.
pub fn render_json(report: &SuiteReport) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn record_has_report_fields() {
        let rendered = render_json(&sample_report()).unwrap();
        assert!(rendered.ends_with("}\n"));
        assert!(rendered.contains("\n  \"generated_at_utc\": \"2026-03-01T09:30:00Z\""));
        assert!(rendered.contains("밸런스 디자이너"));

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        for key in [
            "generated_at_utc",
            "suite",
            "version",
            "suite_lint",
            "config",
            "cases",
            "script_checks",
            "summary",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["cases"][1]["hard_fail_reasons"][1], "assumptions_out_of_range");
        assert_eq!(value["config"]["allow_missing_cases"], true);
        assert_eq!(value["script_checks"]["passed_count"], 1);
    }
}
