use std::collections::{HashMap, VecDeque};

use parrot_core::{ChannelId, Turn};

/// Turns kept per channel before the oldest is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded per-channel history of (input, output) turns.
#[derive(Debug, Clone)]
pub struct ChannelMemory {
    capacity: usize,
    channels: HashMap<ChannelId, VecDeque<Turn>>,
}

impl Default for ChannelMemory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ChannelMemory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a delivered reply. Evicts from the front once over capacity.
    pub fn remember(&mut self, channel: &ChannelId, input: &str, output: &str) {
        self.push(channel, Turn::now(input, output));
    }

    pub fn push(&mut self, channel: &ChannelId, turn: Turn) {
        let history = self.channels.entry(channel.clone()).or_default();
        history.push_back(turn);
        while history.len() > self.capacity {
            history.pop_front();
        }
        tracing::debug!(channel = %channel, turns = history.len(), "remembered turn");
    }

    /// Last `n` turns in chronological order. Unknown channels are empty.
    pub fn recent(&self, channel: &ChannelId, n: usize) -> Vec<&Turn> {
        let Some(history) = self.channels.get(channel) else {
            return Vec::new();
        };
        let skip = history.len().saturating_sub(n);
        history.iter().skip(skip).collect()
    }

    /// Outputs of the last `n` turns, oldest first.
    pub fn recent_outputs(&self, channel: &ChannelId, n: usize) -> Vec<&str> {
        self.recent(channel, n)
            .into_iter()
            .map(|turn| turn.output.as_str())
            .collect()
    }

    pub fn len(&self, channel: &ChannelId) -> usize {
        self.channels.get(channel).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, channel: &ChannelId) -> bool {
        self.len(channel) == 0
    }
}
