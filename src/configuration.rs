use config::{Config, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const BASE_CONFIG: &str = include_str!("../configuration/base.yaml");
const LOCAL_CONFIG: &str = include_str!("../configuration/local.yaml");
const PRODUCTION_CONFIG: &str = include_str!("../configuration/production.yaml");

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub chat: ChatSettings,
    pub portal: PortalSettings,
    pub schedule: ScheduleSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_secret")]
    pub admin_token: SecretString,
    /// Shared with the chat-side bot that relays user commands.
    #[serde(deserialize_with = "deserialize_secret")]
    pub relay_token: SecretString,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub bot_token: SecretString,
    pub timeout_seconds: u64,
    pub ready_poll_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PortalSettings {
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSettings {
    pub jitter_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub utc_offset_hours: i32,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::from(s))
}

impl ChatSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_secs(self.ready_poll_seconds)
    }
}

impl PortalSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ScheduleSettings {
    pub fn jitter(&self) -> Duration {
        Duration::from_secs(self.jitter_seconds)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    dotenvy::dotenv().ok();

    let environment = get_environment()?;
    build_configuration(environment)
}

fn get_environment() -> Result<Environment, config::ConfigError> {
    let env_var = env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string());

    env_var
        .try_into()
        .map_err(|_| config::ConfigError::NotFound("Failed to parse APP_ENVIRONMENT".to_string()))
}

fn build_configuration(environment: Environment) -> Result<Settings, config::ConfigError> {
    let environment_config = match environment {
        Environment::Local => LOCAL_CONFIG,
        Environment::Production => PRODUCTION_CONFIG,
    };

    let config = Config::builder()
        .add_source(File::from_str(BASE_CONFIG, FileFormat::Yaml))
        .add_source(File::from_str(environment_config, FileFormat::Yaml))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    config.try_deserialize::<Settings>()
}

#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
