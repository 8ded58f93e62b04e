use anyhow::{Context, Result};
use async_trait::async_trait;
use parrot_config::DiscordConfig;
use parrot_core::{ChannelMessage, RequestError, UserId};
use parrot_scheduler::RequestExecutor;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::rate_limit::{classify_response, classify_transport};
use crate::request::{PlatformRequest, PlatformResponse};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Performs Discord REST calls for the request scheduler.
///
/// Each call is a single attempt; retry and pacing belong to the scheduler.
#[derive(Debug, Clone)]
pub struct DiscordExecutor {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Deserialize)]
struct CurrentUser {
    id: UserId,
}

impl DiscordExecutor {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(standard_headers())
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build discord http client")?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &DiscordConfig) -> Result<Self> {
        Self::new(&config.api_base, &config.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Send one request; non-2xx statuses become classified errors.
    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), RequestError> {
        let response = request
            .header(AUTHORIZATION, self.token.as_str())
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;

        if status.is_success() {
            Ok((status, body))
        } else {
            Err(classify_response(status, &headers, &body))
        }
    }
}

#[async_trait]
impl RequestExecutor for DiscordExecutor {
    type Request = PlatformRequest;
    type Response = PlatformResponse;

    async fn execute(&self, request: &PlatformRequest) -> Result<PlatformResponse, RequestError> {
        tracing::debug!(kind = request.kind(), "discord request");
        match request {
            PlatformRequest::FetchMessages { channel_id, limit } => {
                let url = self.url(&format!("/channels/{channel_id}/messages?limit={limit}"));
                let (_, body) = self.send(self.client.get(url)).await?;
                let messages: Vec<ChannelMessage> = decode(&body, "message list")?;
                Ok(PlatformResponse::Messages(messages))
            }
            PlatformRequest::FetchIdentity => {
                let (_, body) = self.send(self.client.get(self.url("/users/@me"))).await?;
                let user: CurrentUser = decode(&body, "current user")?;
                Ok(PlatformResponse::Identity(user.id))
            }
            PlatformRequest::Typing { channel_id } => {
                let url = self.url(&format!("/channels/{channel_id}/typing"));
                self.send(self.client.post(url)).await?;
                Ok(PlatformResponse::TypingStarted)
            }
            PlatformRequest::SendReply {
                channel_id,
                message_id,
                content,
            } => {
                let url = self.url(&format!("/channels/{channel_id}/messages"));
                let body = json!({
                    "content": content,
                    "message_reference": {
                        "message_id": message_id.to_string(),
                        "channel_id": channel_id.as_str(),
                    },
                    "allowed_mentions": { "replied_user": false },
                });
                let (status, _) = self.send(self.client.post(url).json(&body)).await?;
                // Only 200 carries the created message; anything else is not a delivered reply.
                if status != StatusCode::OK {
                    return Err(RequestError::Permanent(format!(
                        "reply not accepted: HTTP {status}"
                    )));
                }
                Ok(PlatformResponse::Sent)
            }
        }
    }
}

fn standard_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, RequestError> {
    serde_json::from_str(body)
        .map_err(|err| RequestError::Permanent(format!("malformed {what} response: {err}")))
}

#[cfg(test)]
#[path = "discord_tests.rs"]
mod tests;
