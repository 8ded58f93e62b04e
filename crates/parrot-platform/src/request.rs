use parrot_core::{ChannelId, ChannelMessage, MessageId, UserId};

/// One Discord REST call, as queued in the request scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRequest {
    FetchMessages { channel_id: ChannelId, limit: u32 },
    FetchIdentity,
    Typing { channel_id: ChannelId },
    SendReply {
        channel_id: ChannelId,
        message_id: MessageId,
        content: String,
    },
}

impl PlatformRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FetchMessages { .. } => "fetch_messages",
            Self::FetchIdentity => "fetch_identity",
            Self::Typing { .. } => "typing",
            Self::SendReply { .. } => "send_reply",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformResponse {
    /// Newest first, as the API returns them.
    Messages(Vec<ChannelMessage>),
    Identity(UserId),
    TypingStarted,
    Sent,
}
