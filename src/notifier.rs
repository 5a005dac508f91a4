use crate::chat::ChatHost;
use crate::diff::ChangeSet;
use crate::domain::{ChannelId, UserId};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

const ANNOUNCEMENT_TEMPLATE: &str = "A new grade is available for **{changes}**.";

/// Broadcast text for a change set.
pub fn announcement(changes: &ChangeSet) -> String {
    ANNOUNCEMENT_TEMPLATE.replace("{changes}", &changes.joined())
}

/// What one announcement actually reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub broadcast: bool,
    pub direct: usize,
    pub skipped: usize,
}

pub struct Notifier<'a, H> {
    host: &'a H,
}

impl<'a, H: ChatHost> Notifier<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Posts the announcement in `channel`, then DMs every subscriber who is a
    /// member of that channel's server.
    ///
    /// Delivery is best effort: failures are logged and the remaining
    /// recipients are still tried. Nothing is sent for an empty change set.
    #[instrument(skip_all, fields(channel = %channel, changes = changes.len()))]
    pub async fn announce(
        &self,
        changes: &ChangeSet,
        channel: &ChannelId,
        subscribers: &BTreeSet<UserId>,
    ) -> Delivery {
        let mut delivery = Delivery::default();
        if changes.is_empty() {
            return delivery;
        }
        let text = announcement(changes);

        let server = match self.host.get_channel(channel).await {
            Ok(Some(found)) => found.server,
            Ok(None) => {
                warn!("announcement channel not found, nothing delivered");
                return delivery;
            }
            Err(e) => {
                warn!(error = %e, "failed to resolve announcement channel");
                return delivery;
            }
        };

        match self.host.send_message(channel, &text).await {
            Ok(_) => delivery.broadcast = true,
            Err(e) => warn!(error = %e, "failed to post announcement"),
        }

        let Some(server) = server else {
            delivery.skipped = subscribers.len();
            debug!("announcement channel has no server, subscribers cannot be resolved");
            return delivery;
        };

        for user in subscribers {
            match self.host.get_member(&server, user).await {
                Ok(Some(member)) => match self.host.send_direct_message(&member.user, &text).await {
                    Ok(_) => delivery.direct += 1,
                    Err(e) => {
                        warn!(user = %user, error = %e, "failed to message subscriber");
                        delivery.skipped += 1;
                    }
                },
                Ok(None) => {
                    debug!(user = %user, "subscriber is not a member, skipping");
                    delivery.skipped += 1;
                }
                Err(e) => {
                    warn!(user = %user, error = %e, "failed to resolve subscriber");
                    delivery.skipped += 1;
                }
            }
        }

        info!(
            broadcast = delivery.broadcast,
            direct = delivery.direct,
            skipped = delivery.skipped,
            "announcement delivered"
        );
        delivery
    }
}
