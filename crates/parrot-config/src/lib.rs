//! Configuration for parrot (`~/.config/parrot/config.toml`).
//!
//! Every field has a default; credentials usually arrive through the
//! environment (or a `.env` file) rather than the TOML file.

mod config;
mod persona;
mod validate;

pub use config::{
    Config, DiscordConfig, ENV_DISCORD_TOKEN, ENV_GOOGLE_API_KEY, ENV_LOG_FILE,
    ENV_TARGET_CHANNEL_ID, FilterConfig, GeminiConfig, LogConfig, SchedulerSection, TimingConfig,
};
pub use persona::{FewShotExample, PersonaConfig};
pub use validate::{ConfigError, PLACEHOLDER_API_KEY};
