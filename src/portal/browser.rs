use super::page::{Form, FormMethod, Page};
use crate::error::ConnectionError;
use reqwest::{Client, Response, redirect};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Navigation capability the fetcher and extractor need from a web session.
///
/// Element selection happens on the returned [`Page`].
pub trait Browser {
    fn open(&self, url: &Url) -> impl Future<Output = Result<Page, ConnectionError>> + Send;

    fn submit(&self, form: &Form) -> impl Future<Output = Result<Page, ConnectionError>> + Send;
}

/// Cookie-keeping HTTP session backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<Self, ConnectionError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .redirect(redirect::Policy::limited(max_redirects))
            .build()
            .map_err(ConnectionError::Session)?;
        Ok(Self { client })
    }

    async fn into_page(response: Response) -> Result<Page, ConnectionError> {
        let url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|source| ConnectionError::Request {
                url: url.to_string(),
                source,
            })?;
        debug!(url = %url, bytes = body.len(), "page loaded");
        Ok(Page::new(url, body))
    }
}

impl Browser for HttpBrowser {
    async fn open(&self, url: &Url) -> Result<Page, ConnectionError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ConnectionError::Request {
                url: url.to_string(),
                source,
            })?;
        Self::into_page(response).await
    }

    async fn submit(&self, form: &Form) -> Result<Page, ConnectionError> {
        let request = match form.method() {
            FormMethod::Post => self.client.post(form.action().clone()).form(form.fields()),
            FormMethod::Get => {
                let mut url = form.action().clone();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(form.fields().iter().map(|(k, v)| (k.as_str(), v.as_str())));
                self.client.get(url)
            }
        };
        let response = request
            .send()
            .await
            .map_err(|source| ConnectionError::Request {
                url: form.action().to_string(),
                source,
            })?;
        Self::into_page(response).await
    }
}
