//! Environment scrubbing for child processes.

/// Credentials and socket handles that reference computations never need.
/// They are removed from every child's environment.
pub const SCRUBBED_VARS: &[&str] = &[
    "SSH_AUTH_SOCK",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "GITHUB_TOKEN",
    "GH_TOKEN",
    "CARGO_REGISTRY_TOKEN",
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "DOCKER_HOST",
    "DOCKER_CONFIG",
    "KUBECONFIG",
    "DATABASE_URL",
    "NPM_TOKEN",
];

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use goldencheck_core::traits::{ScriptRequest, ScriptRunner};

    use crate::ProcessRunner;

    #[tokio::test]
    async fn credentials_are_not_inherited() {
        std::env::set_var("NPM_TOKEN", "secret");
        let request = ScriptRequest {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), "printf %s \"${NPM_TOKEN-unset}\"".into()],
            timeout: Duration::from_secs(10),
        };
        let output = ProcessRunner::new().run(&request).await.unwrap();
        std::env::remove_var("NPM_TOKEN");
        assert_eq!(output.stdout, "unset");
    }
}
