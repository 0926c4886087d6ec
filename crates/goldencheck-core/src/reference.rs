//! Cross-checking numeric claims against external reference computations.
//!
//! A case may name a preferred script and describe which values of its JSON
//! output the response should quote. The script is run with the case's input
//! file, each extract rule pulls one expected value out of the output, and a
//! rule matches when any number in the response lies inside its tolerance
//! window. Every failure along the way becomes a failed outcome with a
//! diagnostic; nothing here returns an error to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::error::ScriptError;
use crate::json_path::JsonPath;
use crate::model::{ExtractEntry, ScriptValidation};
use crate::numbers::{extract_numbers, format_significant};
use crate::results::{ratio, ScriptChecks, ScriptHealth};
use crate::traits::{ScriptOutput, ScriptRequest, ScriptRunner};

/// Default per-invocation timeout.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of unmatched rules listed in a check's details.
const MAX_LISTED_MISSES: usize = 6;

/// Where scripts and their inputs live, and how to launch them.
#[derive(Debug, Clone)]
pub struct ScriptEnvironment {
    /// Directory that preferred script names resolve against.
    pub scripts_dir: PathBuf,
    /// Directory that relative `script_validation.input` paths resolve against.
    pub suite_dir: PathBuf,
    /// Interpreter to launch scripts with; `None` executes them directly.
    pub interpreter: Option<String>,
    pub timeout: Duration,
}

impl ScriptEnvironment {
    pub fn script_path(&self, script: &str) -> PathBuf {
        self.scripts_dir.join(script)
    }

    pub fn input_path(&self, input: &str) -> PathBuf {
        let path = Path::new(input);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.suite_dir.join(path)
        }
    }

    fn request(&self, script: &Path, args: &[&str]) -> ScriptRequest {
        ScriptRequest::new(self.interpreter.as_deref(), script, args, self.timeout)
    }
}

/// Score, verdict, and diagnostics of a numeric cross-check.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericOutcome {
    pub score: f64,
    pub passed: bool,
    pub details: String,
}

impl From<ScriptError> for NumericOutcome {
    fn from(err: ScriptError) -> Self {
        Self {
            score: 0.0,
            passed: false,
            details: err.to_string(),
        }
    }
}

/// Run `preferred_script` for a case and match its output against `response`.
pub async fn evaluate_numeric_check(
    runner: &dyn ScriptRunner,
    env: &ScriptEnvironment,
    preferred_script: &str,
    validation: &ScriptValidation,
    response: &str,
) -> NumericOutcome {
    match run_reference(runner, env, preferred_script, validation).await {
        Ok(payload) => {
            let numbers = extract_numbers(response);
            if numbers.is_empty() {
                return ScriptError::NoNumbersInResponse.into();
            }
            match_rules(&payload, validation, &numbers)
        }
        Err(err) => {
            tracing::warn!(script = preferred_script, "reference computation failed: {err}");
            err.into()
        }
    }
}

async fn run_reference(
    runner: &dyn ScriptRunner,
    env: &ScriptEnvironment,
    preferred_script: &str,
    validation: &ScriptValidation,
) -> Result<Value, ScriptError> {
    let script = env.script_path(preferred_script);
    if !script.exists() {
        return Err(ScriptError::NotFound(script));
    }
    if validation.input.trim().is_empty() {
        return Err(ScriptError::InvalidInput);
    }
    let input = env.input_path(validation.input.trim());
    if !input.exists() {
        return Err(ScriptError::InputNotFound(input));
    }
    if validation.extract.is_empty() {
        return Err(ScriptError::InvalidExtract);
    }

    let input_arg = input.to_string_lossy();
    let request = env.request(&script, &["--input", &input_arg, "--format", "json"]);
    tracing::debug!(
        program = %request.program.display(),
        args = ?request.args,
        "running reference computation"
    );
    let output = runner.run(&request).await?;
    parse_json_output(&output)
}

/// Validate a finished script's output and parse its JSON payload.
fn parse_json_output(output: &ScriptOutput) -> Result<Value, ScriptError> {
    if !output.success() {
        return Err(ScriptError::Exit {
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    let stdout = output.stdout.trim();
    if stdout.is_empty() {
        return Err(ScriptError::EmptyStdout);
    }
    serde_json::from_str(stdout).map_err(|e| ScriptError::InvalidJson(e.to_string()))
}

/// Whether any of `candidates` lies within `tolerance` of `expected`.
pub fn any_within_tolerance(candidates: &[f64], expected: f64, tolerance: f64) -> bool {
    candidates.iter().any(|v| (v - expected).abs() <= tolerance)
}

/// Match every extract rule of `validation` against `numbers`.
pub fn match_rules(
    payload: &Value,
    validation: &ScriptValidation,
    numbers: &[f64],
) -> NumericOutcome {
    let mut matched = 0usize;
    let mut missing: Vec<String> = Vec::new();

    for (idx, entry) in validation.extract.iter().enumerate() {
        let ExtractEntry::Rule(rule) = entry else {
            missing.push(format!("rule#{}:invalid_rule", idx + 1));
            continue;
        };
        if rule.path.trim().is_empty() {
            missing.push(format!("rule#{}:missing_path", idx + 1));
            continue;
        }
        let expected = match rule
            .path
            .parse::<JsonPath>()
            .and_then(|path| path.resolve_f64(payload))
        {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("extract rule '{}' failed: {e}", rule.label());
                missing.push(format!("{}:path_error", rule.label()));
                continue;
            }
        };

        let tolerance = rule.tolerance(expected);
        if any_within_tolerance(numbers, expected, tolerance) {
            matched += 1;
        } else {
            missing.push(format!(
                "{}≈{}±{}",
                rule.label(),
                format_significant(expected, 4),
                format_significant(tolerance, 4)
            ));
        }
    }

    let total = validation.extract.len();
    let min_matches = validation.required_matches();
    let mut details = format!("matched {matched}/{total} (min {min_matches})");
    if !missing.is_empty() {
        let listed: Vec<&str> = missing
            .iter()
            .take(MAX_LISTED_MISSES)
            .map(String::as_str)
            .collect();
        details.push_str("; missing: ");
        details.push_str(&listed.join(", "));
        if missing.len() > MAX_LISTED_MISSES {
            details.push_str(" ...");
        }
    }

    NumericOutcome {
        score: ratio(matched, total),
        passed: matched >= min_matches,
        details,
    }
}

/// Run every script once with `--format json` and require exit 0 plus valid JSON.
pub async fn check_script_health(
    runner: &dyn ScriptRunner,
    env: &ScriptEnvironment,
    scripts: &[&str],
) -> ScriptChecks {
    let mut results = Vec::with_capacity(scripts.len());
    for script in scripts {
        let path = env.script_path(script);
        let outcome = probe_script(runner, env, &path).await;
        let (passed, details) = match outcome {
            Ok(()) => (true, "ok".to_string()),
            Err(err) => {
                tracing::warn!(script, "health-check failed: {err}");
                (false, err.health_detail())
            }
        };
        results.push(ScriptHealth {
            script: script.to_string(),
            path: path.to_string_lossy().to_string(),
            passed,
            details,
        });
    }
    ScriptChecks::from_results(results)
}

async fn probe_script(
    runner: &dyn ScriptRunner,
    env: &ScriptEnvironment,
    path: &Path,
) -> Result<(), ScriptError> {
    if !path.exists() {
        return Err(ScriptError::NotFound(path.to_path_buf()));
    }
    let output = runner.run(&env.request(path, &["--format", "json"])).await?;
    parse_json_output(&output).map(|_| ())
}
