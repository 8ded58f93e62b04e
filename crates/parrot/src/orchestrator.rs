use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use parrot_core::{ChannelId, ChannelMessage, MessageId, RandomSource, UserId};
use parrot_memory::{ChannelMemory, ReplyLedger};
use parrot_platform::{ChatPlatform, TextGenerator};
use parrot_select::CandidateSelector;
use tokio_util::sync::CancellationToken;

use crate::timing::Pacing;

/// Settings the loop needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub channel: ChannelId,
    pub fetch_limit: u32,
    /// Lowercased.
    pub banned_words: Vec<String>,
}

/// How one polling cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fetch failed or returned nothing.
    NoMessages,
    /// Scanned the batch without delivering a reply.
    NothingSent,
    Replied(MessageId),
    Stopped,
}

/// Snapshot of the loop for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotStatus {
    pub running: bool,
    pub channel: ChannelId,
    pub user_id: Option<UserId>,
    pub handled: usize,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.running { "RUNNING" } else { "STOPPED" };
        write!(f, "Status: {state}, channel {}", self.channel)?;
        match self.user_id {
            Some(id) => write!(f, ", user ID {id}")?,
            None => write!(f, ", user ID unknown")?,
        }
        write!(f, ", handled messages (current session): {}", self.handled)
    }
}

/// Polls one channel and answers at most one new message per cycle.
///
/// Owns the channel memory and reply ledger; nothing else writes them.
pub struct Orchestrator<P, G> {
    platform: P,
    generator: G,
    selector: CandidateSelector,
    pacing: Pacing,
    settings: LoopSettings,
    memory: ChannelMemory,
    ledger: ReplyLedger,
    user_id: Option<UserId>,
    rng: Box<dyn RandomSource>,
    cancel: CancellationToken,
}

impl<P, G> Orchestrator<P, G>
where
    P: ChatPlatform,
    G: TextGenerator,
{
    pub fn new(
        platform: P,
        generator: G,
        selector: CandidateSelector,
        pacing: Pacing,
        settings: LoopSettings,
        rng: Box<dyn RandomSource>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            platform,
            generator,
            selector,
            pacing,
            settings,
            memory: ChannelMemory::default(),
            ledger: ReplyLedger::new(),
            user_id: None,
            rng,
            cancel,
        }
    }

    pub fn memory(&self) -> &ChannelMemory {
        &self.memory
    }

    pub fn ledger(&self) -> &ReplyLedger {
        &self.ledger
    }

    pub fn status(&self) -> BotStatus {
        BotStatus {
            running: !self.cancel.is_cancelled(),
            channel: self.settings.channel.clone(),
            user_id: self.user_id,
            handled: self.ledger.handled_count(),
        }
    }

    /// Resolve our own user id. Without it self-authored messages cannot be
    /// told apart, so failure is fatal.
    pub async fn bootstrap(&mut self) -> Result<UserId> {
        let id = self
            .platform
            .fetch_identity()
            .await
            .context("Cannot get user ID; check the discord token")?;
        self.user_id = Some(id);
        Ok(id)
    }

    /// Run cycles until cancelled.
    pub async fn run(&mut self) -> Result<()> {
        let user_id = match self.user_id {
            Some(id) => id,
            None => self.bootstrap().await?,
        };
        tracing::info!(
            "Bot started on channel {} as user ID {user_id}",
            self.settings.channel
        );

        while !self.cancel.is_cancelled() {
            let delay = self.pacing.cycle_delay(self.rng.as_mut());
            tracing::info!(
                "Waiting for {} seconds before checking messages...",
                delay.as_secs_f64().round()
            );
            if !self.pause(delay).await {
                break;
            }
            if self.run_cycle().await == CycleOutcome::Stopped {
                break;
            }
        }

        tracing::info!("Bot stopped. {}", self.status());
        Ok(())
    }

    /// One fetch-scan-reply pass over the newest messages.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let channel = self.settings.channel.clone();
        let messages = match self
            .platform
            .fetch_messages(&channel, self.settings.fetch_limit)
            .await
        {
            Ok(messages) => messages,
            Err(err) => {
                tracing::error!("Failed to get messages: {err}");
                Vec::new()
            }
        };
        if messages.is_empty() {
            tracing::info!("No messages or failed to fetch messages.");
            return CycleOutcome::NoMessages;
        }

        // The API returns newest first; answer in chronological order.
        for message in messages.iter().rev() {
            if self.cancel.is_cancelled() {
                return CycleOutcome::Stopped;
            }
            if !self.is_candidate(message) {
                continue;
            }
            if let Some(word) = self.banned_word_in(&message.content) {
                tracing::info!(
                    "Skipped message from {} ({}) due to banned word {word:?}: \"{}\"",
                    message.author.username,
                    message.author.id,
                    message.content
                );
                self.ledger.mark_handled(message.id);
                continue;
            }

            match self.respond_to(&channel, message).await {
                ReplyAttempt::Sent => return CycleOutcome::Replied(message.id),
                ReplyAttempt::Skipped => continue,
                ReplyAttempt::Stopped => return CycleOutcome::Stopped,
            }
        }
        CycleOutcome::NothingSent
    }

    fn is_candidate(&self, message: &ChannelMessage) -> bool {
        if self.user_id == Some(message.author.id) {
            return false;
        }
        if self.ledger.should_skip(message.id) {
            return false;
        }
        !message.content.is_empty()
    }

    fn banned_word_in<'a>(&self, content: &'a str) -> Option<&'a str> {
        if self.settings.banned_words.is_empty() {
            return None;
        }
        content.split_whitespace().find(|word| {
            let lower = word.to_lowercase();
            self.settings.banned_words.iter().any(|banned| *banned == lower)
        })
    }

    async fn respond_to(&mut self, channel: &ChannelId, message: &ChannelMessage) -> ReplyAttempt {
        let input = message.content.as_str();
        tracing::info!(
            "Processing new message from {} ({}): \"{input}\"",
            message.author.username,
            message.author.id
        );

        if !self.pause(self.pacing.read_delay()).await {
            return ReplyAttempt::Stopped;
        }

        let candidates = match self.generator.generate(input).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::error!("Gemini API call failed: {err:#}");
                Vec::new()
            }
        };
        let Some(reply) =
            self.selector
                .select(&candidates, input, channel, &self.memory, self.rng.as_mut())
        else {
            tracing::info!("No valid reply generated for: \"{input}\"");
            self.ledger.mark_handled(message.id);
            return ReplyAttempt::Skipped;
        };
        tracing::info!("- Reply generated: \"{reply}\"");

        if let Err(err) = self.platform.send_typing(channel).await {
            tracing::error!("Failed to simulate typing: {err}");
        }
        let typing = self.pacing.typing_duration(&reply, self.rng.as_mut());
        if !self.pause(typing).await {
            return ReplyAttempt::Stopped;
        }
        let human = self.pacing.human_delay(self.rng.as_mut());
        if !self.pause(human).await {
            return ReplyAttempt::Stopped;
        }

        match self.platform.send_reply(channel, message.id, &reply).await {
            Ok(()) => {
                self.ledger.mark_replied(message.id);
                self.memory.remember(channel, input, &reply);
                tracing::info!(
                    "==> Successfully replied to {}: \"{reply}\"",
                    message.author.username
                );
                ReplyAttempt::Sent
            }
            Err(err) => {
                tracing::error!("Failed to send reply for message ID {}: {err}", message.id);
                // Poison messages must not be retried every cycle.
                self.ledger.mark_handled(message.id);
                ReplyAttempt::Skipped
            }
        }
    }

    /// Sleep unless cancelled first; false means stop.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => !self.cancel.is_cancelled(),
        }
    }
}

enum ReplyAttempt {
    Sent,
    Skipped,
    Stopped,
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
pub(crate) mod tests;
