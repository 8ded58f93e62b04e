//! In-process conversation state: per-channel turn history and the
//! replied-message ledger. Nothing here is persisted.

mod channel;
mod ledger;

pub use channel::{ChannelMemory, DEFAULT_HISTORY_CAPACITY};
pub use ledger::ReplyLedger;
