//! Settings operations users can trigger while the watcher runs.
//!
//! Every command persists through [`ConfigStore::update`] first and only then
//! acknowledges on the chat host. Privilege checks belong to the caller.

use crate::chat::{ChatHost, MessageRef};
use crate::domain::{ChannelId, UserId};
use crate::error::CommandError;
use crate::store::ConfigStore;
use tracing::{info, instrument};

/// Values (compared case-insensitively) that opt a user into direct messages.
pub const YES_STRINGS: [&str; 5] = ["yes", "y", "1", "true", "t"];
pub const WILL_NOTIFY: &str = "🔔";
pub const WONT_NOTIFY: &str = "🔕";
/// Longest accepted interval between cycles: one week.
pub const MAX_LOOP_TIME: u64 = 7 * 24 * 3600;

pub fn wants_notifications(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        let value = value.trim();
        YES_STRINGS.iter().any(|yes| yes.eq_ignore_ascii_case(value))
    })
}

pub fn channel_set_message(channel: &ChannelId) -> String {
    format!(":white_check_mark: New grades will now be announced in <#{channel}>.")
}

pub fn loop_set_message(seconds: u64) -> String {
    format!(":white_check_mark: Time between checks is now **{seconds}** seconds.")
}

/// Opts `user` in or out of direct messages, then reacts on `message`.
///
/// A missing value counts as "no". Returns whether the user is now subscribed.
#[instrument(skip(store, host, message), fields(user = %user))]
pub async fn set_notify<H: ChatHost>(
    store: &ConfigStore,
    host: &H,
    user: &UserId,
    message: &MessageRef,
    value: Option<&str>,
) -> Result<bool, CommandError> {
    let subscribe = wants_notifications(value);
    store
        .update(|record| {
            if subscribe {
                record.notifs.insert(user.clone());
            } else {
                record.notifs.remove(user);
            }
        })
        .await?;
    info!(subscribe, "Notification preference saved");

    let emoji = if subscribe { WILL_NOTIFY } else { WONT_NOTIFY };
    host.add_reaction(message, emoji).await?;
    Ok(subscribe)
}

/// Moves the broadcast to `new_channel`, which must exist on the host.
#[instrument(skip(store, host), fields(invoked_in = %invoking_channel, channel = %new_channel))]
pub async fn set_announcement_channel<H: ChatHost>(
    store: &ConfigStore,
    host: &H,
    invoking_channel: &ChannelId,
    new_channel: ChannelId,
) -> Result<(), CommandError> {
    if host.get_channel(&new_channel).await?.is_none() {
        return Err(CommandError::Invalid(format!(
            "channel {new_channel} does not exist"
        )));
    }

    let confirmation = channel_set_message(&new_channel);
    store
        .update(|record| record.announcement_channel = new_channel)
        .await?;
    info!("Announcement channel saved");

    host.send_message(invoking_channel, &confirmation).await?;
    Ok(())
}

/// Changes the base interval between cycles. Takes effect after the current
/// sleep.
#[instrument(skip(store, host), fields(invoked_in = %invoking_channel))]
pub async fn set_loop_time<H: ChatHost>(
    store: &ConfigStore,
    host: &H,
    invoking_channel: &ChannelId,
    seconds: u64,
) -> Result<(), CommandError> {
    if seconds == 0 {
        return Err(CommandError::Invalid(
            "loop time must be at least one second".to_string(),
        ));
    }
    if seconds > MAX_LOOP_TIME {
        return Err(CommandError::Invalid(format!(
            "loop time must be at most {MAX_LOOP_TIME} seconds"
        )));
    }

    store.update(|record| record.loop_time = seconds).await?;
    info!(seconds, "Loop time saved");

    host.send_message(invoking_channel, &loop_set_message(seconds))
        .await?;
    Ok(())
}
