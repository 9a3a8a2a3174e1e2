//! HTTP transport for the ULDK registry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::RegistryRequest;
use crate::error::{LocatorError, Result};

pub const ULDK_ENDPOINT: &str = "https://uldk.gugik.gov.pl/";

/// Anything that can answer a registry request with the raw response body
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn fetch(&self, request: &RegistryRequest) -> Result<String>;
}

/// Registry client over `reqwest`
pub struct UldkClient {
    client: Client,
    base_url: Url,
}

impl UldkClient {
    pub fn new(base_url: Url, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Full request URL including the query string
    pub fn request_url(&self, request: &RegistryRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        url
    }
}

#[async_trait]
impl RegistryTransport for UldkClient {
    async fn fetch(&self, request: &RegistryRequest) -> Result<String> {
        let url = self.request_url(request);
        debug!("ULDK {} id={}", request.kind.as_str(), request.id);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "ULDK {} failed with status {}",
                request.kind.as_str(),
                status
            );
            return Err(LocatorError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
