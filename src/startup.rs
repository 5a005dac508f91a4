use crate::api::{
    AnnouncementChannelRequest, ErrorResponse, LoopTimeRequest, NotifyRequest, NotifyResponse,
};
use crate::chat::{ChatHost, MessageRef};
use crate::commands::{set_announcement_channel, set_loop_time, set_notify};
use crate::configuration::Settings;
use crate::error::CommandError;
use crate::store::ConfigStore;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct AppState<H> {
    pub store: Arc<ConfigStore>,
    pub host: Arc<H>,
    pub admin_token: SecretString,
    pub relay_token: SecretString,
}

// Derive would require `H: Clone`.
impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            host: self.host.clone(),
            admin_token: self.admin_token.clone(),
            relay_token: self.relay_token.clone(),
        }
    }
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build<H>(
        configuration: &Settings,
        store: Arc<ConfigStore>,
        host: Arc<H>,
    ) -> Result<Self, std::io::Error>
    where
        H: ChatHost + Send + Sync + 'static,
    {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        info!(address = %address, port, "Command surface listening");

        let router = Self::app(AppState {
            store,
            host,
            admin_token: configuration.application.admin_token.clone(),
            relay_token: configuration.application.relay_token.clone(),
        });
        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Bound port; differs from the configured one when that was `0`.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn app<H>(state: AppState<H>) -> Router
    where
        H: ChatHost + Send + Sync + 'static,
    {
        Router::new()
            .route("/health", get(health_check))
            .route("/notify", post(notify_handler::<H>))
            .route("/announcement-channel", put(announcement_channel_handler::<H>))
            .route("/loop-time", put(loop_time_handler::<H>))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    pub async fn run_until_stopped<S>(self, shutdown: S) -> Result<(), std::io::Error>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn health_check() -> &'static str {
    "OK"
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommandError::Invalid(_) => StatusCode::BAD_REQUEST,
            CommandError::Forbidden => StatusCode::UNAUTHORIZED,
            CommandError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CommandError::Host(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            error!(error = %self, "Command failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Checks `Authorization: Bearer <token>`. The relay token guards `notify`,
/// the admin token the privileged commands. An empty configured token locks
/// its routes entirely.
fn require_bearer(headers: &HeaderMap, token: &SecretString) -> Result<(), CommandError> {
    let expected = token.expose_secret();
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match provided {
        Some(token) if !expected.is_empty() && token == expected => Ok(()),
        _ => Err(CommandError::Forbidden),
    }
}

async fn notify_handler<H>(
    State(state): State<AppState<H>>,
    headers: HeaderMap,
    Json(payload): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, CommandError>
where
    H: ChatHost + Send + Sync + 'static,
{
    require_bearer(&headers, &state.relay_token)?;
    let message = MessageRef {
        channel: payload.channel_id,
        id: payload.message_id,
    };
    let subscribed = set_notify(
        &state.store,
        state.host.as_ref(),
        &payload.user_id,
        &message,
        payload.value.as_deref(),
    )
    .await?;
    Ok(Json(NotifyResponse { subscribed }))
}

async fn announcement_channel_handler<H>(
    State(state): State<AppState<H>>,
    headers: HeaderMap,
    Json(payload): Json<AnnouncementChannelRequest>,
) -> Result<StatusCode, CommandError>
where
    H: ChatHost + Send + Sync + 'static,
{
    require_bearer(&headers, &state.admin_token)?;
    set_announcement_channel(
        &state.store,
        state.host.as_ref(),
        &payload.invoking_channel,
        payload.channel_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn loop_time_handler<H>(
    State(state): State<AppState<H>>,
    headers: HeaderMap,
    Json(payload): Json<LoopTimeRequest>,
) -> Result<StatusCode, CommandError>
where
    H: ChatHost + Send + Sync + 'static,
{
    require_bearer(&headers, &state.admin_token)?;
    set_loop_time(
        &state.store,
        state.host.as_ref(),
        &payload.invoking_channel,
        payload.seconds,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
