use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Configuration keys enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    GitlabUrl,
    GitlabToken,
    GitlabProject,
    RocketUrl,
    RocketUser,
    RocketPassword,
    RocketChannel,
    Workers,
    TimeoutSecs,
    DryRun,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::GitlabUrl => "gitlab_url",
            ConfigKey::GitlabToken => "gitlab_token",
            ConfigKey::GitlabProject => "gitlab_project",
            ConfigKey::RocketUrl => "rocket_url",
            ConfigKey::RocketUser => "rocket_user",
            ConfigKey::RocketPassword => "rocket_password",
            ConfigKey::RocketChannel => "rocket_channel",
            ConfigKey::Workers => "workers",
            ConfigKey::TimeoutSecs => "timeout_secs",
            ConfigKey::DryRun => "dry_run",
        }
    }

    /// Get all config keys
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::GitlabUrl,
            ConfigKey::GitlabToken,
            ConfigKey::GitlabProject,
            ConfigKey::RocketUrl,
            ConfigKey::RocketUser,
            ConfigKey::RocketPassword,
            ConfigKey::RocketChannel,
            ConfigKey::Workers,
            ConfigKey::TimeoutSecs,
            ConfigKey::DryRun,
        ]
    }
}

/// Filename for the project-specific configuration within the .branchsweep directory.
pub const PROJECT_CONFIG_FILENAME: &str = "config.json";
/// Directory name for project-specific configuration.
pub const PROJECT_CONFIG_DIR: &str = ".branchsweep";

/// Parses a JSON configuration file content into a map of configuration values.
///
/// Expects `content` to be a JSON object keyed by [`ConfigKey::as_str`].
///
/// - Returns an empty HashMap if the input `content` is empty or contains only whitespace.
/// - Unknown keys are skipped.
/// - Returns an `Err` if the JSON parsing fails or the top-level value is not an object.
pub fn parse_config(content: &[u8]) -> Result<HashMap<ConfigKey, Value>> {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(HashMap::new());
    }

    let value: Value = serde_json::from_slice(content).context("Failed to parse config JSON")?;

    let mut config_map = HashMap::new();

    if let Value::Object(map) = &value {
        for key in ConfigKey::all() {
            if let Some(val) = map.get(key.as_str()) {
                config_map.insert(*key, val.clone());
            }
        }
        return Ok(config_map);
    }

    Err(anyhow::anyhow!("Config must be a JSON object"))
}

/// Merges `updates` into `base_config` and returns a new configuration map.
///
/// If a key exists in both, the value from `updates` wins.
pub fn update_config(
    base_config: &HashMap<ConfigKey, Value>,
    updates: &HashMap<ConfigKey, Value>,
) -> HashMap<ConfigKey, Value> {
    let mut new_config = base_config.clone();
    for (key, value) in updates {
        new_config.insert(*key, value.clone());
    }
    new_config
}

/// Reads the config file.
///
/// An explicitly given path must exist. Without one, `.branchsweep/config.json`
/// under `dir` is used when present and silently skipped otherwise.
pub fn load_config_file(explicit: Option<&Path>, dir: &Path) -> Result<HashMap<ConfigKey, Value>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = dir.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILENAME);
            if !default_path.exists() {
                return Ok(HashMap::new());
            }
            default_path
        }
    };

    let content = std::fs::read(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Everything one sweep needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub gitlab_url: String,
    pub gitlab_token: String,
    pub gitlab_project: u64,
    pub rocket_url: String,
    pub rocket_user: String,
    pub rocket_password: String,
    pub rocket_channel: String,
    pub workers: usize,
    pub timeout: Option<Duration>,
    pub dry_run: bool,
}

impl Settings {
    /// Resolves a merged configuration map.
    ///
    /// Missing strings become empty and a missing project becomes 0; nothing
    /// here checks that the remote services are actually reachable.
    pub fn from_config(config: &HashMap<ConfigKey, Value>) -> Result<Self> {
        let text = |key: ConfigKey| -> Result<String> {
            match config.get(&key) {
                None | Some(Value::Null) => Ok(String::new()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(anyhow::anyhow!(
                    "`{}` must be a string, got {}",
                    key.as_str(),
                    other
                )),
            }
        };
        let number = |key: ConfigKey| -> Result<Option<u64>> {
            match config.get(&key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
                    anyhow::anyhow!("`{}` must be a non-negative integer", key.as_str())
                }),
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .with_context(|| format!("`{}` must be a non-negative integer", key.as_str())),
                Some(other) => Err(anyhow::anyhow!(
                    "`{}` must be a non-negative integer, got {}",
                    key.as_str(),
                    other
                )),
            }
        };

        let dry_run = match config.get(&ConfigKey::DryRun) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(anyhow::anyhow!("`dry_run` must be a boolean, got {}", other));
            }
        };

        Ok(Settings {
            gitlab_url: normalize_url(&text(ConfigKey::GitlabUrl)?),
            gitlab_token: text(ConfigKey::GitlabToken)?,
            gitlab_project: number(ConfigKey::GitlabProject)?.unwrap_or(0),
            rocket_url: normalize_url(&text(ConfigKey::RocketUrl)?),
            rocket_user: text(ConfigKey::RocketUser)?,
            rocket_password: text(ConfigKey::RocketPassword)?,
            rocket_channel: text(ConfigKey::RocketChannel)?,
            workers: number(ConfigKey::Workers)?.map_or(1, |n| n.max(1) as usize),
            timeout: number(ConfigKey::TimeoutSecs)?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            dry_run,
        })
    }
}

/// Prefixes `http://` when the URL carries no scheme and drops trailing slashes.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
