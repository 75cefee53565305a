use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::types::{Config, SlackCredentials};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_SUMMARY_PATH: &str = "karate/target/karate-reports/karate-summary-json.txt";
pub const DEFAULT_ARCHIVE_PATH: &str = "karate/target/cucumber-reports.zip";
pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Loads a dotenv-style settings file into the process environment.
///
/// Variables already set in the environment are left untouched. A missing
/// file is not an error; the credentials check at dispatch time reports it.
pub fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            info!("Loaded settings from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => {
            debug!("No settings file at {}, using process environment only", path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load settings file {}", path.display())),
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    // Credentials are only checked when a dispatch actually needs them.
    let slack_token = non_empty(env.get_var("SLACK_TOKEN"));
    let slack_channel = non_empty(env.get_var("SLACK_CHANNEL"));

    let summary_path = non_empty(env.get_var("REPORT_SUMMARY_PATH"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SUMMARY_PATH));
    let archive_path = non_empty(env.get_var("REPORT_ARCHIVE_PATH"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_PATH));

    let base_url = non_empty(env.get_var("SLACK_API_BASE_URL"))
        .unwrap_or_else(|| DEFAULT_SLACK_API_BASE_URL.to_string());
    reqwest::Url::parse(&base_url).context("Invalid SLACK_API_BASE_URL")?;
    let base_url = base_url.trim_end_matches('/');

    Ok(Config {
        slack_token,
        slack_channel,
        summary_path,
        archive_path,
        post_message_url: format!("{}/chat.postMessage", base_url),
        file_upload_url: format!("{}/files.upload", base_url),
    })
}

impl Config {
    /// Returns the Slack credentials, failing when either one is absent.
    pub fn credentials(&self) -> Result<SlackCredentials> {
        match (&self.slack_token, &self.slack_channel) {
            (Some(token), Some(channel)) => Ok(SlackCredentials {
                token: token.clone(),
                channel: channel.clone(),
            }),
            _ => Err(anyhow!(
                "SLACK_TOKEN and SLACK_CHANNEL not found. Check that your .env file and file path is correct"
            )),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
