use serde::{Deserialize, Serialize};
use url::Url;
use validator::ValidateUrl;

/// Absolute http(s) address of the portal page that lists the courses.
///
/// Detail links scraped from the listing are resolved against this URL,
/// so it has to be absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortalUrl {
    url: Url,
}

impl PortalUrl {
    /// Creates a new `PortalUrl`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gradewatch::domain::PortalUrl;
    ///
    /// let url = PortalUrl::new("https://portal.example.edu/cours.php").unwrap();
    /// assert_eq!(url.as_str(), "https://portal.example.edu/cours.php");
    /// ```
    pub fn new(url: impl Into<String>) -> Result<Self, String> {
        let raw = url.into();
        if !raw.validate_url() {
            return Err(format!("{raw:?} is not a valid url."));
        }
        let url = Url::parse(&raw).map_err(|e| format!("{raw:?} is not a valid url: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("{raw:?} must use http or https."));
        }
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Resolves a link found on a portal page, the way a browser would.
    pub fn join(&self, link: &str) -> Result<Url, url::ParseError> {
        self.url.join(link)
    }
}

impl TryFrom<String> for PortalUrl {
    type Error = String;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        Self::new(url)
    }
}

impl From<PortalUrl> for String {
    fn from(url: PortalUrl) -> Self {
        url.url.into()
    }
}
