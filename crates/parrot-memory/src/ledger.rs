use std::collections::HashSet;

use parrot_core::MessageId;

/// Messages already handled plus the high-water mark of the last reply.
#[derive(Debug, Clone, Default)]
pub struct ReplyLedger {
    handled: HashSet<MessageId>,
    last_replied: Option<MessageId>,
}

impl ReplyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the message was handled or is not newer than the high-water mark.
    pub fn should_skip(&self, id: MessageId) -> bool {
        self.handled.contains(&id) || self.last_replied.is_some_and(|last| id <= last)
    }

    pub fn is_handled(&self, id: MessageId) -> bool {
        self.handled.contains(&id)
    }

    /// Mark handled without moving the high-water mark (skips, failed sends).
    pub fn mark_handled(&mut self, id: MessageId) {
        self.handled.insert(id);
    }

    /// Mark a delivered reply. The high-water mark only moves forward.
    pub fn mark_replied(&mut self, id: MessageId) {
        self.handled.insert(id);
        if self.last_replied.is_none_or(|last| id > last) {
            self.last_replied = Some(id);
        }
    }

    pub fn last_replied(&self) -> Option<MessageId> {
        self.last_replied
    }

    pub fn handled_count(&self) -> usize {
        self.handled.len()
    }
}
