use super::{Channel, ChatHost, Member, MessageRef};
use crate::domain::{ChannelId, MessageId, ServerId, UserId};
use crate::error::HostError;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Bot client for a Discord-style REST API.
#[derive(Clone)]
pub struct ChatClient {
    http_client: Client,
    base_url: String,
    bot_token: SecretString,
    ready_poll: Duration,
}

impl ChatClient {
    pub fn new(
        base_url: String,
        bot_token: SecretString,
        timeout: Duration,
        ready_poll: Duration,
    ) -> Result<Self, HostError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token,
            ready_poll,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            AUTHORIZATION,
            format!("Bot {}", self.bot_token.expose_secret()),
        )
    }

    async fn check(response: Response) -> Result<Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(HostError::Unauthorized);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(HostError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn post_message(&self, channel: &ChannelId, text: &str) -> Result<MessageRef, HostError> {
        let response = self
            .authorized(
                self.http_client
                    .post(self.url(&format!("/channels/{channel}/messages"))),
            )
            .json(&CreateMessageRequest { content: text })
            .send()
            .await?;
        let message: MessagePayload = Self::check(response).await?.json().await?;
        message.try_into()
    }
}

impl ChatHost for ChatClient {
    async fn wait_until_ready(&self) -> Result<(), HostError> {
        loop {
            let outcome = match self
                .authorized(self.http_client.get(self.url("/users/@me")))
                .send()
                .await
            {
                Ok(response) => Self::check(response).await.map(|_| ()),
                Err(e) => Err(HostError::from(e)),
            };
            match outcome {
                Ok(()) => {
                    info!("Chat host is ready");
                    return Ok(());
                }
                Err(HostError::Unauthorized) => return Err(HostError::Unauthorized),
                Err(e) => {
                    warn!(error = %e, "chat host not ready, retrying");
                    tokio::time::sleep(self.ready_poll).await;
                }
            }
        }
    }

    async fn get_channel(&self, id: &ChannelId) -> Result<Option<Channel>, HostError> {
        let response = self
            .authorized(self.http_client.get(self.url(&format!("/channels/{id}"))))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let channel: ChannelPayload = Self::check(response).await?.json().await?;
        channel.try_into().map(Some)
    }

    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<MessageRef, HostError> {
        self.post_message(channel, text).await
    }

    async fn add_reaction(&self, message: &MessageRef, emoji: &str) -> Result<(), HostError> {
        let emoji: String = url::form_urlencoded::byte_serialize(emoji.as_bytes()).collect();
        let path = format!(
            "/channels/{}/messages/{}/reactions/{emoji}/@me",
            message.channel, message.id
        );
        let response = self
            .authorized(self.http_client.put(self.url(&path)))
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    async fn get_member(&self, server: &ServerId, user: &UserId) -> Result<Option<Member>, HostError> {
        let response = self
            .authorized(
                self.http_client
                    .get(self.url(&format!("/guilds/{server}/members/{user}"))),
            )
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check(response).await?;
        Ok(Some(Member { user: user.clone() }))
    }

    async fn send_direct_message(&self, user: &UserId, text: &str) -> Result<MessageRef, HostError> {
        let response = self
            .authorized(self.http_client.post(self.url("/users/@me/channels")))
            .json(&CreateDirectChannelRequest {
                recipient_id: user.as_str(),
            })
            .send()
            .await?;
        let channel: ChannelPayload = Self::check(response).await?.json().await?;
        let channel: Channel = channel.try_into()?;
        self.post_message(&channel.id, text).await
    }
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateDirectChannelRequest<'a> {
    recipient_id: &'a str,
}

#[derive(Deserialize)]
struct ChannelPayload {
    id: String,
    guild_id: Option<String>,
}

#[derive(Deserialize)]
struct MessagePayload {
    id: String,
    channel_id: String,
}

impl TryFrom<ChannelPayload> for Channel {
    type Error = HostError;

    fn try_from(payload: ChannelPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ChannelId::new(payload.id).map_err(HostError::Payload)?,
            server: payload
                .guild_id
                .map(ServerId::new)
                .transpose()
                .map_err(HostError::Payload)?,
        })
    }
}

impl TryFrom<MessagePayload> for MessageRef {
    type Error = HostError;

    fn try_from(payload: MessagePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            channel: ChannelId::new(payload.channel_id).map_err(HostError::Payload)?,
            id: MessageId::new(payload.id).map_err(HostError::Payload)?,
        })
    }
}
