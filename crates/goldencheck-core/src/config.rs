//! Run configuration.
//!
//! Settings come from an optional TOML file, environment overrides, and
//! finally command-line flags (applied by the CLI).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::reference::DEFAULT_SCRIPT_TIMEOUT;

/// Minimum weighted score for a case to pass.
pub const DEFAULT_MIN_CASE_SCORE: f64 = 0.80;
/// Minimum mean case score for the suite to pass.
pub const DEFAULT_MIN_SUITE_SCORE: f64 = 0.85;

/// Scripts directory relative to the repository root, which is two levels
/// above the suite's directory.
const DEFAULT_SCRIPTS_SUBDIR: &str = "skills/game-balance-math/scripts";

/// Top-level goldencheck configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldencheckConfig {
    #[serde(default = "default_min_case_score")]
    pub min_case_score: f64,
    #[serde(default = "default_min_suite_score")]
    pub min_suite_score: f64,
    #[serde(default)]
    pub scripts: ScriptsConfig,
}

/// How external reference computations are located and launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Directory containing the scripts. Derived from the suite location when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Program used to launch a script; empty runs the script file directly.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_min_case_score() -> f64 {
    DEFAULT_MIN_CASE_SCORE
}
fn default_min_suite_score() -> f64 {
    DEFAULT_MIN_SUITE_SCORE
}
fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_SCRIPT_TIMEOUT.as_secs()
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            interpreter: default_interpreter(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for GoldencheckConfig {
    fn default() -> Self {
        Self {
            min_case_score: DEFAULT_MIN_CASE_SCORE,
            min_suite_score: DEFAULT_MIN_SUITE_SCORE,
            scripts: ScriptsConfig::default(),
        }
    }
}

impl ScriptsConfig {
    /// The interpreter, or `None` when scripts run directly.
    pub fn interpreter(&self) -> Option<&str> {
        let interpreter = self.interpreter.trim();
        (!interpreter.is_empty()).then_some(interpreter)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured directory, or the default location for a suite at `suite_path`.
    pub fn dir_for_suite(&self, suite_path: &Path) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        let suite_dir = suite_path.parent().unwrap_or_else(|| Path::new("."));
        match suite_dir.ancestors().nth(2) {
            Some(root) if !root.as_os_str().is_empty() => root.join(DEFAULT_SCRIPTS_SUBDIR),
            _ => suite_dir.join("..").join("..").join(DEFAULT_SCRIPTS_SUBDIR),
        }
    }
}

static ENV_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").expect("env reference regex"));

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to nothing. Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    ENV_REF_RE
        .replace_all(s, |caps: &Captures| std::env::var(&caps[1]).unwrap_or_default())
        .into_owned()
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order when no path is given:
/// 1. `goldencheck.toml` in the current directory
/// 2. `~/.config/goldencheck/config.toml`
///
/// Environment variable overrides: `GOLDENCHECK_SCRIPTS_DIR`, `GOLDENCHECK_INTERPRETER`.
pub fn load_config_from(path: Option<&Path>) -> Result<GoldencheckConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("goldencheck.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content, path.parent())
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GoldencheckConfig::default(),
    };

    if let Ok(dir) = std::env::var("GOLDENCHECK_SCRIPTS_DIR") {
        config.scripts.dir = Some(PathBuf::from(dir));
    }
    if let Ok(interpreter) = std::env::var("GOLDENCHECK_INTERPRETER") {
        config.scripts.interpreter = interpreter;
    }

    Ok(config)
}

/// Parse config text. A relative `scripts.dir` resolves against `base_dir`.
pub fn parse_config_str(content: &str, base_dir: Option<&Path>) -> Result<GoldencheckConfig> {
    let mut config: GoldencheckConfig = toml::from_str(content)?;

    config.scripts.interpreter = resolve_env_vars(&config.scripts.interpreter);
    if let Some(dir) = config.scripts.dir.take() {
        let dir = PathBuf::from(resolve_env_vars(&dir.to_string_lossy()));
        config.scripts.dir = Some(match base_dir {
            Some(base) if dir.is_relative() && !base.as_os_str().is_empty() => base.join(dir),
            _ => dir,
        });
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("goldencheck"))
}

/// Starter configuration written by `goldencheck init`.
pub const STARTER_CONFIG: &str = r#"# goldencheck configuration

# Minimum weighted score for a single case to pass.
min_case_score = 0.80
# Minimum mean score across evaluated cases.
min_suite_score = 0.85

[scripts]
# Directory holding reference computations. Relative to this file.
# dir = "skills/game-balance-math/scripts"
# Program used to launch scripts. Set to "" to execute them directly.
interpreter = "python3"
timeout_secs = 30
"#;
