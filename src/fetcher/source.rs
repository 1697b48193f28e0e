//! Advisory page sources
//!
//! [`AdvisorySource`] is the seam between the retrying fetcher and the network.
//! [`ImdbSource`] is the production implementation backed by reqwest.

use std::future::Future;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use super::config::ImdbSourceConfig;
use super::error::SourceError;
use crate::identifier::AdvisoryId;

/// Result of a single successful request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Raw page markup
    Found(String),

    /// The source has no page for this identifier
    NotFound,
}

/// Something that can retrieve the advisory page for an identifier
pub trait AdvisorySource: Send + Sync {
    /// Perform one retrieval attempt
    fn fetch_page(&self, id: &AdvisoryId) -> impl Future<Output = Result<Page, SourceError>> + Send;
}

/// HTTP source for IMDb parents guide pages
#[derive(Debug, Clone)]
pub struct ImdbSource {
    client: ReqwestClient,
    base_url: Url,
}

impl ImdbSource {
    /// Create a source with the default configuration
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(ImdbSourceConfig::default())
    }

    /// Create a source with custom configuration
    pub fn with_config(config: ImdbSourceConfig) -> Result<Self, SourceError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid base URL {}: {}", base, e)))?;

        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid Accept-Language: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = ReqwestClient::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// URL of the parents guide page for `id`
    pub fn page_url(&self, id: &AdvisoryId) -> Result<Url, SourceError> {
        self.base_url
            .join(&format!("title/{}/parentalguide", id))
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid URL: {}", e)))
    }
}

impl AdvisorySource for ImdbSource {
    #[instrument(skip_all, fields(id = %id), level = "debug")]
    async fn fetch_page(&self, id: &AdvisoryId) -> Result<Page, SourceError> {
        let url = self.page_url(id)?;
        debug!("Sending GET request to {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(Page::NotFound);
        }

        if !status.is_success() {
            warn!("Advisory source answered {} for {}", status, id);
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(Page::Found(body))
    }
}
