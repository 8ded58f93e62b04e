use async_trait::async_trait;
use parrot_core::{ChannelId, ChannelMessage, MessageId, RequestError, UserId};
use parrot_scheduler::{DispatchError, Priority, RequestExecutor, RequestScheduler};

use crate::request::{PlatformRequest, PlatformResponse};

/// Chat operations the reply loop consumes.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Most recent messages, newest first.
    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        limit: u32,
    ) -> Result<Vec<ChannelMessage>, DispatchError>;

    async fn fetch_identity(&self) -> Result<UserId, DispatchError>;

    async fn send_typing(&self, channel_id: &ChannelId) -> Result<(), DispatchError>;

    async fn send_reply(
        &self,
        channel_id: &ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), DispatchError>;
}

/// [`ChatPlatform`] whose every call goes through one [`RequestScheduler`].
///
/// Sends outrank typing indicators, which outrank queries.
pub struct ScheduledPlatform<E: RequestExecutor> {
    scheduler: RequestScheduler<E>,
}

impl<E> ScheduledPlatform<E>
where
    E: RequestExecutor<Request = PlatformRequest, Response = PlatformResponse>,
{
    pub fn new(scheduler: RequestScheduler<E>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &RequestScheduler<E> {
        &self.scheduler
    }

    async fn call(
        &self,
        request: PlatformRequest,
        priority: Priority,
    ) -> Result<PlatformResponse, DispatchError> {
        let kind = request.kind();
        self.scheduler
            .submit(request, priority)
            .await
            .inspect_err(|err| tracing::error!(kind, error = %err, "platform request failed"))
    }
}

fn unexpected(kind: &str, response: &PlatformResponse) -> DispatchError {
    DispatchError::Rejected(RequestError::Permanent(format!(
        "unexpected response to {kind}: {response:?}"
    )))
}

#[async_trait]
impl<E> ChatPlatform for ScheduledPlatform<E>
where
    E: RequestExecutor<Request = PlatformRequest, Response = PlatformResponse>,
{
    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        limit: u32,
    ) -> Result<Vec<ChannelMessage>, DispatchError> {
        let request = PlatformRequest::FetchMessages {
            channel_id: channel_id.clone(),
            limit,
        };
        match self.call(request, Priority::QUERY).await? {
            PlatformResponse::Messages(messages) => Ok(messages),
            other => Err(unexpected("fetch_messages", &other)),
        }
    }

    async fn fetch_identity(&self) -> Result<UserId, DispatchError> {
        match self.call(PlatformRequest::FetchIdentity, Priority::QUERY).await? {
            PlatformResponse::Identity(id) => Ok(id),
            other => Err(unexpected("fetch_identity", &other)),
        }
    }

    async fn send_typing(&self, channel_id: &ChannelId) -> Result<(), DispatchError> {
        let request = PlatformRequest::Typing {
            channel_id: channel_id.clone(),
        };
        match self.call(request, Priority::TYPING).await? {
            PlatformResponse::TypingStarted => Ok(()),
            other => Err(unexpected("typing", &other)),
        }
    }

    async fn send_reply(
        &self,
        channel_id: &ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), DispatchError> {
        let request = PlatformRequest::SendReply {
            channel_id: channel_id.clone(),
            message_id,
            content: content.to_string(),
        };
        match self.call(request, Priority::SEND).await? {
            PlatformResponse::Sent => Ok(()),
            other => Err(unexpected("send_reply", &other)),
        }
    }
}
