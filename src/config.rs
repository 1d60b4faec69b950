use config::{Config, ConfigError, Environment, File};
use serde_derive::Deserialize;
use std::time::Duration;
use thiserror::Error;

const MAX_ATTEMPTS_VAR: &str = "maxAttemptsToGetDone";
const ACCESS_TOKEN_VAR: &str = "githubAccessToken";
const ACCESS_TOKEN_ARG_PREFIX: &str = "githubAccessToken=";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TravisBotConfig {
    #[serde(default)]
    pub travis: TravisConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TravisConfig {
    #[serde(default = "default_travis_api_base")]
    pub api_base: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts_to_get_done: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl TravisConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TravisConfig {
    fn default() -> Self {
        Self {
            api_base: default_travis_api_base(),
            max_attempts_to_get_done: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GithubConfig {
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    pub access_token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            access_token: None,
        }
    }
}

fn default_travis_api_base() -> String {
    "https://api.travis-ci.org".into()
}

fn default_github_api_base() -> String {
    "https://api.github.com".into()
}

fn default_max_attempts() -> u32 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl TravisBotConfig {
    /// Loads the optional config file, then `TRAVISBOT_*` variables (`__` separates nested
    /// keys), then the legacy `maxAttemptsToGetDone`/`githubAccessToken` variables.
    pub fn new(config_file_path: &str) -> Result<Self, ConfigError> {
        let mut config = Config::new();
        let config_file_path = shellexpand::tilde(config_file_path);
        config.merge(File::with_name(&config_file_path).required(false))?;
        config.merge(Environment::with_prefix("travisbot").separator("__"))?;
        let mut loaded: Self = config.try_into()?;
        loaded.apply_legacy_overrides(|name| std::env::var(name).ok())?;
        Ok(loaded)
    }

    fn apply_legacy_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An empty value counts as unset
        let max_attempts = lookup(MAX_ATTEMPTS_VAR).filter(|value| !value.trim().is_empty());
        if let Some(max_attempts) = max_attempts {
            self.travis.max_attempts_to_get_done = max_attempts.trim().parse().map_err(|_| {
                ConfigError::Message(format!(
                    "{} must be a non-negative integer, got '{}'",
                    MAX_ATTEMPTS_VAR, max_attempts
                ))
            })?;
        }
        if let Some(token) = lookup(ACCESS_TOKEN_VAR) {
            self.github.access_token = Some(token);
        }
        Ok(())
    }
}

/// Where a GitHub access token may come from, captured once at process start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub env_token: Option<String>,
    pub args: Vec<String>,
}

impl Credentials {
    pub fn new(env_token: Option<String>, args: Vec<String>) -> Self {
        Self { env_token, args }
    }

    pub fn resolve_access_token(&self) -> Result<String, CredentialsError> {
        let token = match self.env_token.as_deref().filter(|token| !token.is_empty()) {
            Some(token) => Some(token),
            None => self
                .args
                .iter()
                .find_map(|arg| arg.strip_prefix(ACCESS_TOKEN_ARG_PREFIX)),
        };
        match token {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            Some(token) => Err(CredentialsError::InvalidAccessToken(token.to_string())),
            None => Err(CredentialsError::InvalidAccessToken("null".into())),
        }
    }
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CredentialsError {
    #[error("Invalid GitHub access token {0}")]
    InvalidAccessToken(String),
}
