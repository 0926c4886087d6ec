//! Error types for reference computations and JSON path resolution.
//!
//! The `Display` output of these errors is the diagnostic text that ends up
//! in a check's `details`, so the wording is part of the report format.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while running an external reference computation or preparing
/// its inputs. None of these abort a run: the evaluator turns each one into
/// a failed check.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The preferred script does not exist in the scripts directory.
    #[error("script_not_found: {}", .0.display())]
    NotFound(PathBuf),

    /// `script_validation.input` is missing or blank.
    #[error("invalid_script_validation_input")]
    InvalidInput,

    /// The input file referenced by `script_validation.input` does not exist.
    #[error("input_not_found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// `script_validation.extract` is empty.
    #[error("invalid_script_validation_extract")]
    InvalidExtract,

    /// The script exited with a non-zero status.
    #[error("script_exit_{code}: {stderr}")]
    Exit { code: i32, stderr: String },

    /// The script succeeded but printed nothing.
    #[error("script_empty_stdout")]
    EmptyStdout,

    /// The script printed something that is not JSON.
    #[error("script_invalid_json: {0}")]
    InvalidJson(String),

    /// The script did not finish before the timeout.
    #[error("script_timeout: {0}s")]
    Timeout(u64),

    /// The script process could not be started.
    #[error("script_spawn_failed: {0}")]
    Spawn(String),

    /// The response contains no numeric literal to compare against.
    #[error("no_numeric_values_in_response")]
    NoNumbersInResponse,
}

impl ScriptError {
    /// Short diagnostic used by the batch health-check, which reports
    /// failures without the per-case prefixes.
    pub fn health_detail(&self) -> String {
        match self {
            ScriptError::NotFound(_) => "file_not_found".to_string(),
            ScriptError::Exit { code, stderr } => format!("exit={code}: {stderr}"),
            ScriptError::EmptyStdout => "empty_stdout".to_string(),
            ScriptError::InvalidJson(e) => format!("invalid_json_output: {e}"),
            ScriptError::Timeout(_) => "timeout".to_string(),
            ScriptError::Spawn(e) => format!("spawn_failed: {e}"),
            other => other.to_string(),
        }
    }
}

/// Errors raised while resolving a [`crate::json_path::JsonPath`] against a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("missing key '{key}' in path '{path}'")]
    MissingKey { key: String, path: String },

    #[error("non-integer index '{token}' in path '{path}'")]
    NonIntegerIndex { token: String, path: String },

    #[error("index out of range ({index}) in path '{path}'")]
    IndexOutOfRange { index: usize, path: String },

    #[error("cannot descend into scalar at token '{token}' for path '{path}'")]
    ScalarDescent { token: String, path: String },

    #[error("value at path '{path}' is not numeric")]
    NotNumeric { path: String },

    #[error("malformed path '{0}'")]
    Malformed(String),
}

/// A responses document matched none of the supported shapes.
#[derive(Debug, Clone, Error)]
#[error("unsupported responses payload shape")]
pub struct ResponseShapeError;
