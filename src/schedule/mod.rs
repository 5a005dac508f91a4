use crate::chat::ChatHost;
use crate::error::ConnectionError;
use crate::pipeline::{CycleOutcome, run_cycle};
use crate::portal::Browser;
use crate::store::ConfigStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// `base_secs` shifted by a uniform offset in `[-jitter, +jitter]`, never
/// below zero.
pub fn jittered_interval<R: Rng>(base_secs: u64, jitter: Duration, rng: &mut R) -> Duration {
    let base = Duration::from_secs(base_secs);
    if jitter.is_zero() {
        return base;
    }
    let spread = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX / 2);
    let sample = rng.random_range(0..=spread.saturating_mul(2));
    if sample >= spread {
        base.saturating_add(Duration::from_millis(sample - spread))
    } else {
        base.saturating_sub(Duration::from_millis(spread - sample))
    }
}

/// Periodic driver for [`run_cycle`].
///
/// Armed until its token is cancelled, retired afterwards. `session` builds a
/// fresh browser for every cycle so cookies never leak between logins.
pub struct Scheduler<B, H, F> {
    store: Arc<ConfigStore>,
    host: Arc<H>,
    session: F,
    jitter: Duration,
    token: CancellationToken,
    _browser: PhantomData<fn() -> B>,
}

impl<B, H, F> Scheduler<B, H, F>
where
    B: Browser + Send + Sync + 'static,
    H: ChatHost + Send + Sync + 'static,
    F: Fn() -> Result<B, ConnectionError> + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<ConfigStore>,
        host: Arc<H>,
        session: F,
        jitter: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            store,
            host,
            session,
            jitter,
            token,
            _browser: PhantomData,
        }
    }

    pub fn spawn(self) -> SchedulerHandle {
        let token = self.token.clone();
        let join = tokio::spawn(self.run());
        SchedulerHandle { token, join }
    }

    /// Runs cycles until retired and returns how many were started.
    #[instrument(skip_all)]
    pub async fn run(self) -> usize {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                info!("Scheduler retired before the chat host was ready");
                return 0;
            }
            ready = self.host.wait_until_ready() => {
                if let Err(e) = ready {
                    error!(error = %e, "Chat host never became ready, scheduler stopped");
                    return 0;
                }
            }
        }

        let mut rng = StdRng::from_os_rng();
        let mut cycles = 0;
        loop {
            if self.token.is_cancelled() {
                break;
            }

            cycles += 1;
            match (self.session)() {
                Ok(browser) => match run_cycle(&browser, self.host.as_ref(), &self.store).await {
                    CycleOutcome::Changed(changes) => {
                        info!(cycle = cycles, changes = changes.len(), "Cycle announced new items")
                    }
                    CycleOutcome::Unchanged => info!(cycle = cycles, "Cycle found nothing new"),
                    CycleOutcome::Failed => warn!(cycle = cycles, "Cycle failed, retrying next interval"),
                },
                Err(e) => error!(cycle = cycles, error = %e, "Failed to open a portal session"),
            }

            let loop_time = self.store.current().await.loop_time;
            let delay = jittered_interval(loop_time, self.jitter, &mut rng);
            info!(delay_ms = delay.as_millis() as u64, "Waiting for next cycle...");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                _ = self.token.cancelled() => break,
            }
        }

        info!(cycles, "Scheduler retired");
        cycles
    }
}

/// Owner side of a spawned [`Scheduler`].
pub struct SchedulerHandle {
    token: CancellationToken,
    join: JoinHandle<usize>,
}

impl SchedulerHandle {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_retired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stops the loop at its next cycle boundary or sleep.
    pub fn retire(&self) {
        self.token.cancel();
    }

    pub async fn wait(self) -> Result<usize, JoinError> {
        self.join.await
    }
}
