//! Suite and response loading.
//!
//! Suites are read as an untyped document first so lint can observe which
//! fields are present, then converted into the typed [`Suite`] model.
//! Responses come either from a single payload file or from a directory with
//! one text file per case.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::error::ResponseShapeError;
use crate::model::{is_truthy, scalar_text, Case, Suite, Template};

/// Extensions tried, in order, when looking up a case's response file.
pub const RESPONSE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Case id to response text.
pub type Responses = BTreeMap<String, String>;

/// A structural defect found in a suite document. Lint issues are reported
/// but never stop scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// The case the issue belongs to, when it belongs to one.
    pub case_id: Option<String>,
    pub message: String,
}

impl LintIssue {
    fn suite(message: impl Into<String>) -> Self {
        Self {
            case_id: None,
            message: message.into(),
        }
    }

    fn case(case_id: &str, message: impl fmt::Display) -> Self {
        Self {
            case_id: Some(case_id.to_string()),
            message: format!("case {case_id}: {message}"),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A suite ready for scoring, with the lint issues found while loading it.
#[derive(Debug, Clone)]
pub struct LoadedSuite {
    pub suite: Suite,
    pub lint_issues: Vec<LintIssue>,
    /// Where the suite was loaded from.
    pub path: PathBuf,
}

impl LoadedSuite {
    pub fn lint_passed(&self) -> bool {
        self.lint_issues.is_empty()
    }

    /// Directory relative `script_validation.input` paths resolve against.
    pub fn suite_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Read a `.json` or `.toml` document into an untyped value.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_document(&content, path)
}

fn parse_document(content: &str, source_path: &Path) -> Result<Value> {
    let extension = source_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display())),
        "toml" => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display())),
        _ => bail!(
            "unsupported file extension: {} (expected .json or .toml)",
            source_path.display()
        ),
    }
}

/// Load, lint, and convert a suite file.
pub fn parse_suite(path: &Path) -> Result<LoadedSuite> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read suite file: {}", path.display()))?;
    parse_suite_str(&content, path)
}

/// Parse suite text; the format is chosen by `source_path`'s extension.
pub fn parse_suite_str(content: &str, source_path: &Path) -> Result<LoadedSuite> {
    let document = parse_document(content, source_path)?;
    let lint_issues = lint_suite(&document);
    for issue in &lint_issues {
        tracing::warn!("lint: {issue}");
    }

    let fallback_name = source_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let suite = build_suite(&document, &fallback_name)?;

    Ok(LoadedSuite {
        suite,
        lint_issues,
        path: source_path.to_path_buf(),
    })
}

/// Check a raw suite document for structural defects.
pub fn lint_suite(document: &Value) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let empty = Map::new();

    let templates = document.get("templates").and_then(Value::as_object);
    if templates.is_none() {
        issues.push(LintIssue::suite("suite.templates must be an object"));
    }
    let templates = templates.unwrap_or(&empty);

    let Some(cases) = document.get("cases").and_then(Value::as_array) else {
        issues.push(LintIssue::suite("suite.cases must be an array"));
        return issues;
    };

    let mut seen = HashSet::new();
    for (idx, case) in cases.iter().enumerate() {
        let idx = idx + 1;
        let Some(case) = case.as_object() else {
            issues.push(LintIssue::suite(format!("cases[{idx}] must be an object")));
            continue;
        };

        let case_id = case.get("id").map(scalar_text).unwrap_or_default();
        let case_id = case_id.trim();
        if case_id.is_empty() {
            issues.push(LintIssue::suite(format!("cases[{idx}] missing id")));
        } else if !seen.insert(case_id.to_string()) {
            issues.push(LintIssue {
                case_id: Some(case_id.to_string()),
                message: format!("duplicate case id: {case_id}"),
            });
        }

        let template = case
            .get("expected_template")
            .map(scalar_text)
            .unwrap_or_default();
        let template = template.trim();
        if !template.is_empty() && !templates.contains_key(template) {
            issues.push(LintIssue::case(
                case_id,
                format!("unknown expected_template '{template}'"),
            ));
        }

        for key in ["prompt", "required_references", "required_keywords"] {
            if !case.contains_key(key) {
                issues.push(LintIssue::case(case_id, format!("missing '{key}'")));
            }
        }

        lint_script_validation(case_id, case, &mut issues);
    }

    issues
}

fn lint_script_validation(case_id: &str, case: &Map<String, Value>, issues: &mut Vec<LintIssue>) {
    let validation = match case.get("script_validation") {
        None | Some(Value::Null) => return,
        Some(v) => v,
    };

    if !case.get("preferred_script").is_some_and(is_truthy) {
        issues.push(LintIssue::case(
            case_id,
            "script_validation requires preferred_script",
        ));
    }
    let Some(validation) = validation.as_object() else {
        issues.push(LintIssue::case(case_id, "script_validation must be an object"));
        return;
    };

    if !is_non_blank_str(validation.get("input")) {
        issues.push(LintIssue::case(
            case_id,
            "script_validation.input must be a non-empty string",
        ));
    }

    match validation.get("extract").and_then(Value::as_array) {
        Some(rules) if !rules.is_empty() => {
            for (ridx, rule) in rules.iter().enumerate() {
                let ridx = ridx + 1;
                let Some(rule) = rule.as_object() else {
                    issues.push(LintIssue::case(
                        case_id,
                        format!("script_validation.extract[{ridx}] must be an object"),
                    ));
                    continue;
                };
                if !is_non_blank_str(rule.get("path")) && !is_non_blank_str(rule.get("json_path")) {
                    issues.push(LintIssue::case(
                        case_id,
                        format!("script_validation.extract[{ridx}] requires path or json_path"),
                    ));
                }
            }
        }
        _ => issues.push(LintIssue::case(
            case_id,
            "script_validation.extract must be a non-empty array",
        )),
    }
}

/// Convert a suite document into the typed model. Only a document whose
/// `templates` or `cases` cannot be used at all is an error; defects inside
/// a case are lint issues and the case is still scored.
pub fn build_suite(document: &Value, fallback_name: &str) -> Result<Suite> {
    let Some(root) = document.as_object() else {
        bail!("suite file must decode to an object");
    };

    let templates = match root.get("templates") {
        None => BTreeMap::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, raw)| (name.clone(), Template::from_value(raw)))
            .collect(),
        Some(_) => bail!("suite has invalid templates/cases structure"),
    };

    let cases = match root.get("cases") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(Case::from_map)
            .collect(),
        Some(_) => bail!("suite has invalid templates/cases structure"),
    };

    let name = match root.get("suite") {
        Some(v) if !v.is_null() => scalar_text(v),
        _ => fallback_name.to_string(),
    };
    let version = match root.get("version") {
        Some(v) if !v.is_null() => scalar_text(v),
        _ => "unknown".to_string(),
    };

    Ok(Suite {
        name,
        version,
        templates,
        cases,
    })
}

/// Extract `id -> response` pairs from a responses document.
///
/// Accepted shapes: `{"responses": {id: text}}`, `{"cases": [{id, response}]}`,
/// a flat `{id: text}` map, or a top-level `[{id, response}]` array.
pub fn parse_response_payload(payload: &Value) -> Result<Responses, ResponseShapeError> {
    match payload {
        Value::Object(map) => {
            if let Some(Value::Object(responses)) = map.get("responses") {
                return Ok(responses
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(id, v)| (id.clone(), scalar_text(v)))
                    .collect());
            }
            if let Some(Value::Array(items)) = map.get("cases") {
                return Ok(collect_id_response_pairs(items));
            }
            let direct: Responses = map
                .iter()
                .filter(|(_, v)| !v.is_object() && !v.is_array() && !v.is_null())
                .map(|(id, v)| (id.clone(), scalar_text(v)))
                .collect();
            if direct.is_empty() {
                Err(ResponseShapeError)
            } else {
                Ok(direct)
            }
        }
        Value::Array(items) => Ok(collect_id_response_pairs(items)),
        _ => Err(ResponseShapeError),
    }
}

fn collect_id_response_pairs(items: &[Value]) -> Responses {
    items
        .iter()
        .filter_map(|item| {
            let id = item.get("id")?;
            let response = item.get("response")?;
            Some((scalar_text(id), scalar_text(response)))
        })
        .collect()
}

/// Load responses from a single `.json`/`.toml` payload file.
pub fn load_responses_from_file(path: &Path) -> Result<Responses> {
    let payload = load_document(path)?;
    let responses = parse_response_payload(&payload)
        .with_context(|| format!("failed to load responses from {}", path.display()))?;
    tracing::debug!("loaded {} responses from {}", responses.len(), path.display());
    Ok(responses)
}

/// Load `<id>.md`, `<id>.markdown`, or `<id>.txt` for each case id.
/// Cases without a file are simply absent from the result.
pub fn load_responses_from_dir(dir: &Path, case_ids: &[&str]) -> Result<Responses> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let mut responses = Responses::new();
    for case_id in case_ids {
        let found = RESPONSE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{case_id}.{ext}")))
            .find(|candidate| candidate.is_file());
        if let Some(path) = found {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read response file: {}", path.display()))?;
            responses.insert(case_id.to_string(), text);
        }
    }
    tracing::debug!("loaded {} responses from {}", responses.len(), dir.display());
    Ok(responses)
}

/// Parse a comma-separated case id list, dropping blanks.
pub fn parse_case_ids(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw.filter(|r| !r.is_empty())?;
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn is_non_blank_str(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}
