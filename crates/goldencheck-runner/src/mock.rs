//! Mock runner for testing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use goldencheck_core::error::ScriptError;
use goldencheck_core::traits::{ScriptOutput, ScriptRequest, ScriptRunner};

/// What the mock does for a given script.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Finish with this output.
    Output(ScriptOutput),
    /// Fail as if the timeout elapsed.
    Timeout,
}

/// A script runner that never spawns anything.
///
/// Behaviors are keyed by script file name; a request's script is taken
/// from the first argument when an interpreter is used, else the program.
pub struct MockRunner {
    behaviors: HashMap<String, MockBehavior>,
    default: MockBehavior,
    call_count: AtomicU32,
    requests: Mutex<Vec<ScriptRequest>>,
}

impl MockRunner {
    /// Every script prints `stdout` and exits 0.
    pub fn with_fixed_output(stdout: &str) -> Self {
        Self {
            behaviors: HashMap::new(),
            default: MockBehavior::Output(ScriptOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Override the behavior for one script.
    pub fn on(mut self, script: &str, behavior: MockBehavior) -> Self {
        self.behaviors.insert(script.to_string(), behavior);
        self
    }

    /// Convenience for a script that prints `stdout` and exits with `exit_code`.
    pub fn on_output(self, script: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.on(
            script,
            MockBehavior::Output(ScriptOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        )
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn requests(&self) -> Vec<ScriptRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The interpreter's first argument is the script; without an
    /// interpreter the program itself is.
    fn script_name(request: &ScriptRequest) -> String {
        let script = match request.args.first() {
            Some(first) if !first.starts_with("--") => Path::new(first),
            _ => request.program.as_path(),
        };
        script
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScriptRunner for MockRunner {
    async fn run(&self, request: &ScriptRequest) -> Result<ScriptOutput, ScriptError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let behavior = self
            .behaviors
            .get(&Self::script_name(request))
            .unwrap_or(&self.default);
        match behavior {
            MockBehavior::Output(output) => Ok(output.clone()),
            MockBehavior::Timeout => Err(ScriptError::Timeout(request.timeout.as_secs())),
        }
    }
}
