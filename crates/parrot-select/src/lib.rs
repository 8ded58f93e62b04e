//! Reply candidate selection: turns a batch of generated candidates into at
//! most one reply, deduplicated against channel history and normalized to
//! the bot's chat register.

mod filters;
mod rewrite;
mod selector;
mod style;

pub use filters::{
    OVERUSED_STARTERS, contains_emoji, dedup_near_duplicates, drop_overused_starters,
    pick_novel_candidate, strip_pictographs,
};
pub use rewrite::{DENIAL_REPLIES, enforce_community_perspective, is_insider_question, override_if_insider};
pub use selector::{CandidateSelector, SelectorConfig};
pub use style::{enforce_shortness, humanize, is_weak_reply, sanitize_final};
