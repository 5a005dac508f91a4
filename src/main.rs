use gradewatch::chat::ChatClient;
use gradewatch::configuration::get_configuration;
use gradewatch::portal::HttpBrowser;
use gradewatch::startup::Application;
use gradewatch::store::ConfigStore;
use gradewatch::telemetry::init_subscriber;
use gradewatch::Scheduler;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = get_configuration()?;
    init_subscriber("info", configuration.telemetry.utc_offset_hours);

    info!("Starting gradewatch...");

    let store = Arc::new(ConfigStore::load_or_init(&configuration.store.path).await?);
    let chat_client = Arc::new(ChatClient::new(
        configuration.chat.base_url.clone(),
        configuration.chat.bot_token.clone(),
        configuration.chat.timeout(),
        configuration.chat.ready_poll(),
    )?);

    let portal = configuration.portal.clone();
    let token = CancellationToken::new();
    let scheduler = Scheduler::new(
        store.clone(),
        chat_client.clone(),
        move || HttpBrowser::new(portal.timeout(), portal.max_redirects),
        configuration.schedule.jitter(),
        token.clone(),
    )
    .spawn();

    let application = Application::build(&configuration, store, chat_client).await?;
    info!(port = application.port(), "Listening for commands");

    let shutdown = token.clone();
    application
        .run_until_stopped(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
                _ = shutdown.cancelled() => {},
            }
            shutdown.cancel();
        })
        .await?;

    scheduler.retire();
    match scheduler.wait().await {
        Ok(cycles) => info!(cycles, "Scheduler stopped"),
        Err(e) => error!(error = %e, "Scheduler task failed"),
    }
    Ok(())
}
