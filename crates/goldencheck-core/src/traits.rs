//! The seam between the scoring engine and external reference computations.
//!
//! The engine never spawns processes itself; it asks a [`ScriptRunner`].
//! `goldencheck-runner` provides the process-backed implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScriptError;

/// Executes an external computation and captures its output.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run the request to completion. Only launch failures and timeouts are
    /// errors; a non-zero exit comes back as a normal [`ScriptOutput`].
    async fn run(&self, request: &ScriptRequest) -> Result<ScriptOutput, ScriptError>;
}

/// A fully resolved invocation of an external computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    /// Program to execute (an interpreter, or the script itself).
    pub program: PathBuf,
    /// Arguments, including the script path when an interpreter is used.
    pub args: Vec<String>,
    /// Hard wall-clock limit.
    pub timeout: Duration,
}

impl ScriptRequest {
    /// Build a request for `script`, launched through `interpreter` when one is given.
    pub fn new(
        interpreter: Option<&str>,
        script: &Path,
        script_args: &[&str],
        timeout: Duration,
    ) -> Self {
        let script_args = script_args.iter().map(|a| a.to_string());
        match interpreter {
            Some(interpreter) => Self {
                program: PathBuf::from(interpreter),
                args: std::iter::once(script.to_string_lossy().to_string())
                    .chain(script_args)
                    .collect(),
                timeout,
            },
            None => Self {
                program: script.to_path_buf(),
                args: script_args.collect(),
                timeout,
            },
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit status; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
