//! External collaborators: the Discord REST surface (funneled through the
//! request scheduler) and the Gemini text generator.

mod client;
mod discord;
mod gemini;
mod prompt;
mod rate_limit;
mod request;

pub use client::{ChatPlatform, ScheduledPlatform};
pub use discord::DiscordExecutor;
pub use gemini::{GeminiGenerator, TextGenerator};
pub use prompt::build_prompt;
pub use rate_limit::{classify_response, classify_transport, parse_retry_after};
pub use request::{PlatformRequest, PlatformResponse};

#[cfg(test)]
mod test_support;
