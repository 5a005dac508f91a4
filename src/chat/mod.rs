//! The chat host the watcher lives in: where announcements go, who can be
//! messaged, and how command invocations are acknowledged.

mod client;

pub use client::ChatClient;

use crate::domain::{ChannelId, MessageId, ServerId, UserId};
use crate::error::HostError;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    /// `None` for direct-message channels.
    pub server: Option<ServerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel: ChannelId,
    pub id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: UserId,
}

pub trait ChatHost {
    /// Resolves once the host accepts requests.
    fn wait_until_ready(&self) -> impl Future<Output = Result<(), HostError>> + Send;

    fn get_channel(
        &self,
        id: &ChannelId,
    ) -> impl Future<Output = Result<Option<Channel>, HostError>> + Send;

    fn send_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<MessageRef, HostError>> + Send;

    fn add_reaction(
        &self,
        message: &MessageRef,
        emoji: &str,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Membership lookup; `None` when the user is not on that server.
    fn get_member(
        &self,
        server: &ServerId,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<Member>, HostError>> + Send;

    fn send_direct_message(
        &self,
        user: &UserId,
        text: &str,
    ) -> impl Future<Output = Result<MessageRef, HostError>> + Send;
}
