use crate::chat::ChatHost;
use crate::diff::{ChangeSet, compute_changes};
use crate::error::CycleError;
use crate::notifier::Notifier;
use crate::portal::{Browser, PortalAccess, connect, extract_snapshot};
use crate::store::ConfigStore;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new; the store was not touched.
    Unchanged,
    /// New items were persisted and announced.
    Changed(ChangeSet),
    /// Fetch, extraction or persistence failed; nothing was mutated or sent.
    Failed,
}

/// One fetch → extract → diff → persist → notify pass.
///
/// Failures end the cycle quietly (they are logged), so the scheduler can
/// carry on with the next one.
#[instrument(skip_all)]
pub async fn run_cycle<B, H>(browser: &B, host: &H, store: &ConfigStore) -> CycleOutcome
where
    B: Browser,
    H: ChatHost,
{
    info!("Starting check");
    let record = store.current().await;
    let access = PortalAccess::from(&record);

    let fetched = match fetch(browser, &access).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "Something bad happened during the browsing");
            return CycleOutcome::Failed;
        }
    };

    let changes = compute_changes(&record.last_save, &fetched);
    if changes.is_empty() {
        info!("Did verification, no difference was found between old and new data");
        return CycleOutcome::Unchanged;
    }
    warn!(
        old = ?record.last_save,
        new = ?fetched,
        changes = %changes,
        "Difference found between old and new data"
    );

    // Persist before announcing: if the write fails the next cycle sees the
    // same growth again and announces it then.
    let persisted = store
        .update(|current| {
            let previous = std::mem::take(&mut current.last_save);
            current.last_save = previous.absorb(fetched);
            (
                current.announcement_channel.clone(),
                current.notifs.clone(),
            )
        })
        .await;
    let (channel, subscribers) = match persisted {
        Ok(targets) => targets,
        Err(e) => {
            error!(error = %e, "failed to persist the new snapshot, skipping announcement");
            return CycleOutcome::Failed;
        }
    };

    Notifier::new(host)
        .announce(&changes, &channel, &subscribers)
        .await;
    CycleOutcome::Changed(changes)
}

async fn fetch<B: Browser>(
    browser: &B,
    access: &PortalAccess,
) -> Result<crate::diff::Snapshot, CycleError> {
    let listing = connect(browser, access).await?;
    extract_snapshot(browser, &listing, &access.url).await
}
