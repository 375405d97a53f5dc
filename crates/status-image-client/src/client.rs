//! Upstream image fetching

use crate::error::{FetchError, Result};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Default upstream serving one image per HTTP status code
pub const DEFAULT_BASE_URL: &str = "https://http.cat/";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client for fetching status-code images
#[derive(Debug, Clone)]
pub struct StatusImageClient {
    client: Client,
    base_url: String,
}

impl StatusImageClient {
    /// Create a client for the given base URL.
    ///
    /// A trailing `/` is appended to the path when missing so that
    /// `base + key` always addresses a path segment. URLs with a query or
    /// fragment cannot take a key suffix and are rejected.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url)?;
        if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
            return Err(FetchError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        let base_url = url.to_string();

        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self { client, base_url })
    }

    /// Base URL that keys are appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the image for `key` from upstream.
    ///
    /// Transport errors, non-success statuses and empty bodies all fail.
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, key);
        debug!(url = %url, "Fetching image from upstream");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Upstream rejected image request");
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let data = response.bytes().await?.to_vec();
        if data.is_empty() {
            warn!(url = %url, "Upstream returned an empty body");
            return Err(FetchError::EmptyBody);
        }

        debug!(url = %url, size = data.len(), "Fetched image from upstream");
        Ok(data)
    }
}
