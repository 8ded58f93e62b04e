use parrot_core::{ChannelId, RandomSource, seeded};
use parrot_memory::ChannelMemory;

use crate::filters::{
    contains_emoji, dedup_near_duplicates, drop_overused_starters, pick_novel_candidate,
    strip_pictographs,
};
use crate::rewrite::{enforce_community_perspective, override_if_insider};
use crate::style::{enforce_shortness, humanize, is_weak_reply, sanitize_final};

/// Tunables for [`CandidateSelector`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    /// Recent outputs inspected for overused starters.
    pub starter_window: usize,
    /// Uses of a filler starter in that window before it is banned.
    pub starter_limit: usize,
    /// Candidates more similar than this to a kept one are dropped.
    pub near_duplicate_threshold: f64,
    /// Recent outputs scored against during the novelty pick.
    pub novelty_window: usize,
    pub max_words: usize,
    pub hedge_probability: f64,
    pub hedge_min_chars: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            starter_window: 5,
            starter_limit: 2,
            near_duplicate_threshold: 0.75,
            novelty_window: 10,
            max_words: 12,
            hedge_probability: 0.10,
            hedge_min_chars: 25,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateSelector {
    config: SelectorConfig,
}

impl CandidateSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Reduce `raw` candidates for a reply to `input` to at most one reply.
    ///
    /// Style randomness comes from the channel-seeded generator; `rng` only
    /// drives the denial pick for insider questions. `None` means nothing
    /// worth sending survived.
    pub fn select(
        &self,
        raw: &[String],
        input: &str,
        channel: &ChannelId,
        memory: &ChannelMemory,
        rng: &mut dyn RandomSource,
    ) -> Option<String> {
        let cfg = &self.config;
        let keep_emoji = contains_emoji(input);
        let candidates: Vec<String> = raw
            .iter()
            .map(|candidate| {
                if keep_emoji {
                    candidate.trim().to_string()
                } else {
                    strip_pictographs(candidate).trim().to_string()
                }
            })
            .filter(|candidate| !candidate.is_empty())
            .collect();

        let starter_window = memory.recent_outputs(channel, cfg.starter_window);
        let candidates = drop_overused_starters(candidates, &starter_window, cfg.starter_limit);
        if candidates.is_empty() {
            tracing::debug!(channel = %channel, "no candidates left after starter filter");
            return None;
        }

        let unique = dedup_near_duplicates(candidates, cfg.near_duplicate_threshold);
        let history = memory.recent_outputs(channel, cfg.novelty_window);
        let chosen = pick_novel_candidate(&unique, &history)?;
        tracing::debug!(channel = %channel, kept = unique.len(), chosen, "picked candidate");

        let chosen = enforce_community_perspective(chosen);
        let chosen = override_if_insider(input, &chosen, rng);
        let mut style_rng = seeded(channel.as_str());
        let chosen = humanize(
            &chosen,
            &mut style_rng,
            cfg.hedge_probability,
            cfg.hedge_min_chars,
        );
        let chosen = enforce_shortness(&chosen, cfg.max_words);
        let chosen = sanitize_final(&chosen);

        if is_weak_reply(&chosen) {
            tracing::debug!(channel = %channel, "reply collapsed to nothing usable");
            return None;
        }
        Some(chosen)
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
