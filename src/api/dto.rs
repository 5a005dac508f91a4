use crate::domain::{ChannelId, MessageId, UserId};
use serde::{Deserialize, Serialize};

/// A user's `notify` invocation, relayed by the chat-side bot.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    /// Missing means "no".
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotifyResponse {
    pub subscribed: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementChannelRequest {
    pub invoking_channel: ChannelId,
    pub channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
pub struct LoopTimeRequest {
    pub invoking_channel: ChannelId,
    pub seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
