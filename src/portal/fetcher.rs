use super::browser::Browser;
use super::page::Page;
use crate::domain::PortalUrl;
use crate::error::ConnectionError;
use crate::store::Record;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument};

pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";

/// What is needed to reach the listing page behind the portal login.
#[derive(Debug, Clone)]
pub struct PortalAccess {
    pub url: PortalUrl,
    pub form_id: String,
    pub login: String,
    pub password: SecretString,
}

impl From<&Record> for PortalAccess {
    fn from(record: &Record) -> Self {
        Self {
            url: record.url.clone(),
            form_id: record.form_id.clone(),
            login: record.login.clone(),
            password: record.password.clone(),
        }
    }
}

/// Logs in and returns the listing page.
///
/// The target is opened a second time after submitting because the portal
/// lands on its home page after a successful login.
#[instrument(skip_all, fields(url = %access.url.as_str(), form_id = %access.form_id))]
pub async fn connect<B: Browser>(browser: &B, access: &PortalAccess) -> Result<Page, ConnectionError> {
    info!("Opening portal");
    let login_page = browser.open(access.url.as_url()).await?;

    info!("Looking for login form");
    let mut form = login_page.form(&access.form_id)?;
    debug!(action = %form.action(), fields = form.fields().len(), "found login form");

    info!(login = %access.login, "Filling credentials");
    form.set(USERNAME_FIELD, access.login.as_str())?;
    form.set(PASSWORD_FIELD, access.password.expose_secret())?;
    browser.submit(&form).await?;

    info!("Returning to target page");
    browser.open(access.url.as_url()).await
}
