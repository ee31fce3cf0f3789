//! HTTP fetcher for proxy-detection services
//!
//! One shared client with a hard request timeout; a service that hangs or
//! errors surfaces as a collaborator failure and the engine fails open.

use std::time::Duration;

use async_trait::async_trait;
use gateguard_core::{GuardError, HttpFetcher, Result};
use reqwest::Client;

pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GuardError::ProxyService(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GuardError::ProxyService(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GuardError::ProxyService(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| GuardError::ProxyService(e.to_string()))
    }
}
