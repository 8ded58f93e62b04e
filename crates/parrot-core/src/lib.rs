//! Shared types for parrot: identifiers, turns, the request error taxonomy,
//! string similarity and the seeded randomness used by reply selection.

pub mod error;
pub mod rng;
pub mod similarity;
pub mod types;

pub use error::{InvalidSnowflake, RequestError};
pub use rng::{Mulberry32, RandomSource, ScriptedRandom, ThreadRandom, channel_seed, seeded};
pub use similarity::{levenshtein, similarity};
pub use types::{Author, ChannelId, ChannelMessage, MessageId, Snowflake, Turn, UserId};
