//! The `goldencheck validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use goldencheck_core::parser;

use super::{EXIT_FAIL, EXIT_PASS};

pub fn execute(suite_path: PathBuf) -> Result<i32> {
    let document = parser::load_document(&suite_path)?;
    let issues = parser::lint_suite(&document);

    let case_count = document
        .get("cases")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    println!("Suite: {} ({case_count} cases)", suite_path.display());

    for issue in &issues {
        let prefix = issue
            .case_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} LINT: {}", issue.message);
    }

    let fallback_name = suite_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    parser::build_suite(&document, &fallback_name)
        .with_context(|| format!("suite cannot be scored: {}", suite_path.display()))?;

    if issues.is_empty() {
        println!("Suite valid.");
        Ok(EXIT_PASS)
    } else {
        println!("\n{} lint issue(s) found.", issues.len());
        Ok(EXIT_FAIL)
    }
}
