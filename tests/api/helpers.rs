use gradewatch::chat::ChatClient;
use gradewatch::configuration::get_configuration;
use gradewatch::startup::Application;
use gradewatch::store::ConfigStore;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use wiremock::MockServer;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const RELAY_TOKEN: &str = "test-relay-token";

pub struct TestApp {
    pub address: String,
    pub store: Arc<ConfigStore>,
    pub chat_server: MockServer,
    client: reqwest::Client,
}

impl TestApp {
    async fn wait_for_server(&self) {
        let url = self.url("/health");

        // Try to connect to the server for up to 5 seconds
        for _ in 0..50 {
            match self.client.get(&url).send().await {
                Ok(_) => return,
                Err(_) => {
                    sleep(Duration::from_millis(100)).await;
                    continue;
                }
            }
        }
        panic!("Server failed to start within 5 seconds");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get_health(&self) -> reqwest::Response {
        self.client
            .get(self.url("/health"))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_notify(&self, body: serde_json::Value) -> reqwest::Response {
        self.post_notify_as(body, Some(RELAY_TOKEN)).await
    }

    pub async fn post_notify_as(
        &self,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> reqwest::Response {
        self.privileged(self.client.post(self.url("/notify")), token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_announcement_channel(
        &self,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> reqwest::Response {
        self.privileged(self.client.put(self.url("/announcement-channel")), token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_loop_time(
        &self,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> reqwest::Response {
        self.privileged(self.client.put(self.url("/loop-time")), token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    fn privileged(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn cleanup(&self) {
        if let Some(dir) = self.store.path().parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}

fn temp_store_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("gradewatch_api_{}", rand::random::<u64>()))
        .join("config.json")
}

pub async fn spawn_app() -> TestApp {
    let chat_server = MockServer::start().await;

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.application.host = "127.0.0.1".to_string();
    configuration.application.port = 0;
    configuration.application.admin_token = SecretString::from(ADMIN_TOKEN.to_string());
    configuration.application.relay_token = SecretString::from(RELAY_TOKEN.to_string());

    let store = Arc::new(
        ConfigStore::load_or_init(temp_store_path())
            .await
            .expect("Failed to initialize the store."),
    );
    let chat_client = ChatClient::new(
        chat_server.uri(),
        SecretString::from("bot-token".to_string()),
        Duration::from_secs(5),
        Duration::from_millis(10),
    )
    .expect("Failed to build the chat client.");

    let application = Application::build(&configuration, store.clone(), Arc::new(chat_client))
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    tokio::spawn(application.run_until_stopped(std::future::pending()));

    let app = TestApp {
        address,
        store,
        chat_server,
        client: reqwest::Client::new(),
    };
    app.wait_for_server().await;
    app
}
