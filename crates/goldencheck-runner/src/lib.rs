//! goldencheck-runner — Execution of external reference computations.
//!
//! [`ProcessRunner`] launches scripts as child processes under a hard
//! timeout. [`mock::MockRunner`] serves canned outputs for tests.

pub mod env;
pub mod mock;

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use goldencheck_core::error::ScriptError;
use goldencheck_core::traits::{ScriptOutput, ScriptRequest, ScriptRunner};

/// Runs reference computations as local child processes.
///
/// The child gets no stdin, a scrubbed environment, and is killed if it
/// outlives the request's timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptRunner for ProcessRunner {
    async fn run(&self, request: &ScriptRequest) -> Result<ScriptOutput, ScriptError> {
        let start = Instant::now();

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for var in env::SCRUBBED_VARS {
            cmd.env_remove(var);
        }

        let child = cmd
            .spawn()
            .map_err(|e| ScriptError::Spawn(format!("{}: {e}", request.program.display())))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ScriptError::Spawn(e.to_string()))?,
            Err(_) => {
                tracing::warn!(
                    program = %request.program.display(),
                    "killed after {}s timeout",
                    request.timeout.as_secs()
                );
                return Err(ScriptError::Timeout(request.timeout.as_secs()));
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            program = %request.program.display(),
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "process finished"
        );

        Ok(ScriptOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
