use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use parrot_scheduler::{RetryPolicy, SchedulerConfig};
use serde::{Deserialize, Serialize};

use crate::persona::PersonaConfig;

pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_TARGET_CHANNEL_ID: &str = "TARGET_CHANNEL_ID";
pub const ENV_LOG_FILE: &str = "PARROT_LOG_FILE";

const DEFAULT_API_BASE: &str = "https://discord.com/api/v9";
const DEFAULT_FETCH_LIMIT: u32 = 50;
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_LOG_FILE: &str = "bot_activity.log";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Raw user token sent in the `Authorization` header.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Messages fetched per cycle.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            api_base: default_api_base(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_fetch_limit() -> u32 {
    DEFAULT_FETCH_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_BASE.to_string(),
            temperature: 0.9,
            top_p: 0.85,
            max_output_tokens: 35,
            candidate_count: 6,
        }
    }
}

/// Human-like pacing of the reply loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Sleep between cycles, uniform in `[min, max]` seconds.
    pub reply_delay_min_secs: u64,
    pub reply_delay_max_secs: u64,
    /// Pause after a fetched batch before replying.
    pub read_delay_secs: u64,
    pub human_delay_min_ms: u64,
    pub human_delay_max_ms: u64,
    pub typing_min_ms: u64,
    pub typing_max_ms: u64,
    /// Simulated typing speed in characters per second.
    pub typing_cps_min: f64,
    pub typing_cps_max: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reply_delay_min_secs: 60,
            reply_delay_max_secs: 60,
            read_delay_secs: 15,
            human_delay_min_ms: 1000,
            human_delay_max_ms: 5000,
            typing_min_ms: 900,
            typing_max_ms: 6000,
            typing_cps_min: 7.0,
            typing_cps_max: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub rate_limit_margin_ms: u64,
    pub backoff_cap_secs: u64,
    pub transient_step_ms: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            min_interval_ms: defaults.min_interval.as_millis() as u64,
            max_retries: defaults.retry.max_retries,
            rate_limit_margin_ms: defaults.retry.rate_limit_margin.as_millis() as u64,
            backoff_cap_secs: defaults.retry.backoff_cap.as_secs(),
            transient_step_ms: defaults.retry.transient_step.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Messages containing any of these words (case-insensitive, whole
    /// whitespace-separated words) are never answered.
    #[serde(default)]
    pub banned_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Activity log path, truncated at startup.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

impl Config {
    /// Load configuration, then apply `.env` and process environment overrides.
    ///
    /// An explicit `path` must exist. Without one, the per-user config file is
    /// used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::from_file(path)?
            }
            None => match Self::config_path() {
                Ok(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        if let Err(err) = dotenv::dotenv() {
            tracing::debug!(error = %err, "no .env file loaded");
        }
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Path to the per-user config file: `~/.config/parrot/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "parrot")
            .context("Failed to determine config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override file values with non-empty variables from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = var(ENV_DISCORD_TOKEN) {
            self.discord.token = token;
        }
        if let Some(key) = var(ENV_GOOGLE_API_KEY) {
            self.gemini.api_key = key;
        }
        if let Some(channel) = var(ENV_TARGET_CHANNEL_ID) {
            self.discord.channel_id = channel;
        }
        if let Some(file) = var(ENV_LOG_FILE) {
            self.log.file = PathBuf::from(file);
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        let s = &self.scheduler;
        SchedulerConfig {
            min_interval: Duration::from_millis(s.min_interval_ms),
            retry: RetryPolicy {
                max_retries: s.max_retries,
                rate_limit_margin: Duration::from_millis(s.rate_limit_margin_ms),
                backoff_cap: Duration::from_secs(s.backoff_cap_secs),
                transient_step: Duration::from_millis(s.transient_step_ms),
            },
        }
    }

    /// Lowercased banned words, ready for matching.
    pub fn banned_words(&self) -> Vec<String> {
        self.filter
            .banned_words
            .iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect()
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.discord.token = redact_secret(&copy.discord.token);
        copy.gemini.api_key = redact_secret(&copy.gemini.api_key);
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

fn redact_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "<unset>".to_string(),
        n if n <= 8 => "****".to_string(),
        n => {
            let tail: String = chars[n - 4..].iter().collect();
            format!("****{tail}")
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
