use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the project config file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "prledger.toml";

/// Settings read from one TOML file. Unset keys fall through to the next
/// layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
    #[serde(default)]
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub ledger_path: Option<PathBuf>,
    pub token: Option<String>,
}

/// Values taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub github_token: Option<String>,
    pub github_api: Option<String>,
}

impl EnvOverrides {
    /// Read `GITHUB_TOKEN` and `PRLEDGER_GITHUB_API`, ignoring empty values.
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            github_token: non_empty("GITHUB_TOKEN"),
            github_api: non_empty("PRLEDGER_GITHUB_API"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub ledger_path: PathBuf,
    pub api_url: String,
    pub token: Option<String>,
    pub lock_timeout: Duration,
}

/// Read `prledger.toml` from `project_root`; a missing file is empty.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<FileConfig> {
    load_file(&project_root.join(PROJECT_CONFIG_FILE))
}

/// Read `<config_dir>/prledger/config.toml`; a missing file is empty.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<FileConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(FileConfig::default());
    };
    load_file(&config_dir.join("prledger/config.toml"))
}

fn load_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<FileConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config files and layer them under the environment and `cli`.
///
/// # Errors
///
/// Fails if either config file is unreadable or malformed.
pub fn resolve_config(project_root: &Path, cli: &CliOverrides) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;
    Ok(layer(cli, &EnvOverrides::from_env(), &project, &user))
}

/// Precedence: command line, environment, project file, user file, defaults.
#[must_use]
pub fn layer(
    cli: &CliOverrides,
    env: &EnvOverrides,
    project: &FileConfig,
    user: &FileConfig,
) -> EffectiveConfig {
    let ledger_path = cli
        .ledger_path
        .clone()
        .or_else(|| project.ledger_path.clone())
        .or_else(|| user.ledger_path.clone())
        .unwrap_or_else(default_ledger_path);

    let api_url = env
        .github_api
        .clone()
        .or_else(|| project.github.api_url.clone())
        .or_else(|| user.github.api_url.clone())
        .unwrap_or_else(default_api_url);

    let token = cli
        .token
        .clone()
        .or_else(|| env.github_token.clone())
        .or_else(|| project.github.token.clone())
        .or_else(|| user.github.token.clone());

    let lock_timeout_ms = project
        .lock_timeout_ms
        .or(user.lock_timeout_ms)
        .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);

    EffectiveConfig {
        ledger_path,
        api_url: api_url.trim_end_matches('/').to_string(),
        token,
        lock_timeout: Duration::from_millis(lock_timeout_ms),
    }
}

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

fn default_ledger_path() -> PathBuf {
    PathBuf::from("prs.json")
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
