//! Proxy/VPN detection with a TTL cache
//!
//! External proxy-detection services are slow network calls, so their
//! verdicts are memoized per address. A failed call never blocks admission:
//! the resolver fails open ("not a proxy") and leaves the cache untouched so
//! the next attempt retries against the live service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use regex::Regex;

use crate::config::{ProxyCheckSettings, ProxyServiceSettings};
use crate::error::{GuardError, Result};

/// Placeholder in a service URL template replaced by the queried address.
const ADDRESS_PLACEHOLDER: &str = "{IP}";

/// Black-box HTTP collaborator used to query the configured services.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch the raw response body for the given URL.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// One configured proxy-detection service: an endpoint template plus the
/// pattern that marks a response as "is a proxy".
#[derive(Debug, Clone)]
pub struct ProxyService {
    url: String,
    pattern: Regex,
}

impl ProxyService {
    pub fn from_settings(settings: &ProxyServiceSettings) -> Result<Self> {
        let pattern = Regex::new(&settings.pattern).map_err(|e| {
            GuardError::Config(format!(
                "invalid response pattern for proxy service {}: {e}",
                settings.url
            ))
        })?;
        Ok(Self {
            url: settings.url.clone(),
            pattern,
        })
    }

    fn url_for(&self, address: &str) -> String {
        self.url.replace(ADDRESS_PLACEHOLDER, address)
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedVerdict {
    result: bool,
    expires_at: Instant,
}

/// Memoizing front for the configured proxy-detection services.
pub struct ProxyResolver {
    services: Vec<ProxyService>,
    fetcher: Arc<dyn HttpFetcher>,
    cache: DashMap<String, CachedVerdict>,
    ttl: Duration,
}

impl ProxyResolver {
    pub fn from_settings(
        settings: &ProxyCheckSettings,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Result<Self> {
        let services = settings
            .services
            .iter()
            .map(ProxyService::from_settings)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            services,
            fetcher,
            cache: DashMap::new(),
            ttl: Duration::from_secs(settings.cache_duration_secs),
        })
    }

    /// Whether the address is behind a proxy or VPN according to any of the
    /// configured services. Results are cached for the configured TTL; an
    /// expired entry is recomputed and overwritten.
    pub async fn is_proxy(&self, address: &str) -> bool {
        if let Some(entry) = self.cache.get(address) {
            if entry.expires_at > Instant::now() {
                return entry.result;
            }
        }

        let mut any_response = false;
        let mut detected = false;
        for service in &self.services {
            let url = service.url_for(address);
            match self.fetcher.fetch(&url).await {
                Ok(body) => {
                    any_response = true;
                    if service.pattern.is_match(&body) {
                        detected = true;
                        break;
                    }
                }
                Err(e) => {
                    // Fail open and keep the cache untouched so the next
                    // attempt retries against the live service.
                    warn!("Proxy service {url} failed: {e}");
                }
            }
        }

        if any_response {
            self.cache.insert(
                address.to_string(),
                CachedVerdict {
                    result: detected,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        } else if !self.services.is_empty() {
            debug!("Every proxy service failed for {address}, treating as clean");
        }

        detected
    }

    /// Drop expired entries; run from the periodic sweep task.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.cache.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of live cached verdicts, for status reporting.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
