//! Core data model types for goldencheck.
//!
//! A golden prompt suite is a set of reusable templates plus the cases that
//! reference them. These types are built once per run by [`crate::parser`]
//! and are never mutated afterwards.
//!
//! Suites are hand-edited, so conversion from the raw document is lenient:
//! scalars are stringified where text is expected, numeric strings are
//! accepted where numbers are expected, and malformed values fall back to
//! their defaults. Lint reports the defects; scoring goes on.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::json_path::as_number;

/// Default relative tolerance for extract rules.
pub const DEFAULT_RTOL: f64 = 0.02;

/// Default assumption ceiling for templates that do not set one.
pub const DEFAULT_MAX_ASSUMPTIONS: usize = 3;

/// A named, versioned collection of templates and cases.
#[derive(Debug, Clone)]
pub struct Suite {
    /// Suite name (falls back to the suite file name).
    pub name: String,
    /// Suite version, normalized to a string.
    pub version: String,
    /// Templates keyed by name.
    pub templates: BTreeMap<String, Template>,
    /// Cases in declaration order.
    pub cases: Vec<Case>,
}

impl Suite {
    /// The template a case scores against. Cases without a template, or with
    /// an unknown one, get the default template.
    pub fn template_for(&self, case: &Case) -> Template {
        let key = case.expected_template.trim();
        if key.is_empty() {
            return Template::default();
        }
        self.templates.get(key).cloned().unwrap_or_default()
    }

    /// Every distinct `preferred_script` in the suite, in first-seen order.
    pub fn preferred_scripts(&self) -> Vec<&str> {
        let mut scripts: Vec<&str> = Vec::new();
        for case in &self.cases {
            if let Some(script) = case.preferred_script.as_deref() {
                if !script.is_empty() && !scripts.contains(&script) {
                    scripts.push(script);
                }
            }
        }
        scripts
    }

    /// Restrict the suite to the given case ids, keeping suite order.
    pub fn select_cases(&self, ids: Option<&[String]>) -> Vec<&Case> {
        match ids {
            Some(ids) if !ids.is_empty() => self
                .cases
                .iter()
                .filter(|c| ids.iter().any(|id| id == &c.id))
                .collect(),
            _ => self.cases.iter().collect(),
        }
    }
}

/// Structural requirements shared by several cases.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Level-2 section headings the response must contain.
    pub required_sections: Vec<String>,
    /// Maximum number of entries allowed in the assumptions section.
    pub max_assumptions: usize,
    /// Qualitative traits the response must exhibit.
    pub required_traits: Vec<String>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            required_sections: Vec::new(),
            max_assumptions: DEFAULT_MAX_ASSUMPTIONS,
            required_traits: Vec::new(),
        }
    }
}

impl Template {
    /// Build a template from its raw entry. A non-object entry is the default
    /// template; a negative or non-numeric `max_assumptions` is clamped or
    /// defaulted.
    pub fn from_value(raw: &Value) -> Self {
        let Some(map) = raw.as_object() else {
            return Self::default();
        };
        Self {
            required_sections: text_list(map.get("required_sections")),
            max_assumptions: map
                .get("max_assumptions")
                .and_then(as_integer)
                .map_or(DEFAULT_MAX_ASSUMPTIONS, |n| n.max(0) as usize),
            required_traits: text_list(map.get("required_traits")),
        }
    }
}

/// One gradable prompt with its own keyword, reference, and script requirements.
#[derive(Debug, Clone, Default)]
pub struct Case {
    /// Unique identifier within the suite.
    pub id: String,
    pub title: String,
    pub category: String,
    /// The prompt given to the assistant. Not scored, only linted.
    pub prompt: String,
    /// Template key; empty means "no template".
    pub expected_template: String,
    /// Terms that must appear in the response (case-insensitive).
    pub required_keywords: Vec<String>,
    /// References that must be cited in the response (case-insensitive).
    pub required_references: Vec<String>,
    /// External computation the case treats as numeric ground truth.
    pub preferred_script: Option<String>,
    /// How to cross-check the response against the preferred script.
    pub script_validation: Option<CaseValidation>,
}

impl Case {
    /// Build a case from its raw object.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let text = |key: &str| raw.get(key).map(scalar_text).unwrap_or_default();
        Self {
            id: text("id"),
            title: text("title"),
            category: text("category"),
            prompt: text("prompt"),
            expected_template: text("expected_template"),
            required_keywords: text_list(raw.get("required_keywords")),
            required_references: text_list(raw.get("required_references")),
            preferred_script: raw
                .get("preferred_script")
                .filter(|v| is_truthy(v))
                .map(scalar_text),
            script_validation: match raw.get("script_validation") {
                None | Some(Value::Null) => None,
                Some(Value::Object(map)) => {
                    Some(CaseValidation::Descriptor(ScriptValidation::from_map(map)))
                }
                Some(_) => Some(CaseValidation::Malformed),
            },
        }
    }
}

/// The `script_validation` field of a case, when present.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseValidation {
    /// A descriptor object: the script is run and its output cross-checked.
    Descriptor(ScriptValidation),
    /// Present but not an object. Only the script mention is checked, and a
    /// miss still counts as a numeric mismatch.
    Malformed,
}

/// Describes how to run the preferred script and what to pull out of its output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptValidation {
    /// Input file passed as `--input`; relative paths resolve against the suite directory.
    pub input: String,
    /// Values to extract from the script's JSON output.
    pub extract: Vec<ExtractEntry>,
    /// How many rules must match for the check to pass (default: all).
    pub min_matches: Option<i64>,
}

impl ScriptValidation {
    /// Build a descriptor from its raw object. A non-string `input` becomes
    /// blank and a non-array `extract` becomes empty; both fail the check later.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        Self {
            input: raw
                .get("input")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            extract: match raw.get("extract") {
                Some(Value::Array(items)) => items.iter().map(ExtractEntry::from_value).collect(),
                _ => Vec::new(),
            },
            min_matches: raw.get("min_matches").and_then(as_integer),
        }
    }

    /// Number of matched rules required to pass, clamped to `[0, total]`.
    pub fn required_matches(&self) -> usize {
        let total = self.extract.len() as i64;
        self.min_matches.unwrap_or(total).clamp(0, total) as usize
    }
}

/// One element of `script_validation.extract`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractEntry {
    Rule(ExtractRule),
    /// Not an object. Counts toward the total but never matches.
    Invalid,
}

impl ExtractEntry {
    pub fn from_value(raw: &Value) -> Self {
        match raw.as_object() {
            Some(map) => Self::Rule(ExtractRule::from_map(map)),
            None => Self::Invalid,
        }
    }
}

impl From<ExtractRule> for ExtractEntry {
    fn from(rule: ExtractRule) -> Self {
        Self::Rule(rule)
    }
}

/// Pulls one expected scalar out of a reference computation's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractRule {
    /// Dotted/indexed path into the JSON payload.
    pub path: String,
    pub name: Option<String>,
    /// Absolute tolerance (default 0).
    pub atol: Option<f64>,
    /// Relative tolerance (default 0.02).
    pub rtol: Option<f64>,
}

impl ExtractRule {
    /// Build a rule from its raw object. `path` wins when it is set, otherwise
    /// `json_path` is used. A non-string path is blank. Tolerances that do
    /// not read as numbers fall back to their defaults.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let path = match raw.get("path") {
            Some(v) if is_truthy(v) => Some(v),
            _ => raw.get("json_path"),
        };
        Self {
            path: path
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: raw.get("name").filter(|v| !v.is_null()).map(scalar_text),
            atol: raw.get("atol").and_then(as_number),
            rtol: raw.get("rtol").and_then(as_number),
        }
    }

    /// Label used in diagnostics: the rule name, or its path.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }

    /// Width of the match window around `expected`: `max(atol, |expected| * rtol)`.
    /// Negative tolerances are treated as zero, so the window is never negative.
    pub fn tolerance(&self, expected: f64) -> f64 {
        let atol = self.atol.unwrap_or(0.0).max(0.0);
        let rtol = self.rtol.unwrap_or(DEFAULT_RTOL).max(0.0);
        atol.max(expected.abs() * rtol)
    }
}

/// Render a scalar the way it should appear as text: strings verbatim,
/// null as empty, everything else as JSON.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whether a value counts as set: not null, false, zero, or empty.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A list of strings from an array of scalars. Nulls are dropped, other
/// items are stringified, and a bare string is a one-item list.
fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(scalar_text)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Integer reading of a scalar. Floats truncate toward zero, strings must
/// hold an integer, booleans are 1/0.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
