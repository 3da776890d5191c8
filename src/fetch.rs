//! Upstream fetch collaborators
//!
//! The refresh engine asks a [`Fetcher`] for fresh content whenever a cached
//! resource is missing or unusable. [`HttpFetcher`] downloads the resources
//! that have a public plain-text source; [`OfflineFetcher`] never touches the
//! network, so every repair comes from fallback data.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::resources::{ResourceDefinition, Shape};

/// Community-maintained disposable email domain list
const DISPOSABLE_DOMAINS_URL: &str = "https://raw.githubusercontent.com/disposable-email-domains/disposable-email-domains/main/disposable_email_blocklist.conf";

/// IANA list of top-level domains
const TLD_LIST_URL: &str = "https://data.iana.org/TLD/tlds-alpha-by-domain.txt";

/// Errors that can occur when fetching a resource from upstream
#[derive(Debug, Error)]
pub enum FetchError {
    /// The resource has no upstream source
    #[error("no upstream source for '{0}'")]
    NoUpstream(String),

    /// Network access is disabled
    #[error("offline mode: upstream fetch skipped")]
    Offline,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Upstream answered with no usable entries
    #[error("{0} returned no entries")]
    Empty(String),
}

/// Supplies fresh content for a resource
///
/// Implementations own their transport, timeouts and parsing. Returning an
/// error makes the refresh engine fall back to the built-in dataset.
pub trait Fetcher {
    /// Fetches content for `definition`, shaped as it will be cached
    fn fetch(
        &self,
        definition: &ResourceDefinition,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// Fetcher that always fails, used when network access is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    async fn fetch(&self, _definition: &ResourceDefinition) -> Result<Value, FetchError> {
        Err(FetchError::Offline)
    }
}

/// Fetcher that downloads plain-text lists over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client for making requests
    http_client: Client,
    /// Upstream URL per resource name
    sources: HashMap<String, String>,
}

impl HttpFetcher {
    /// Creates a new HttpFetcher with the default upstream sources
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("delivcache/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let sources = [
            ("disposable_domains", DISPOSABLE_DOMAINS_URL),
            ("tld_list", TLD_LIST_URL),
        ]
        .into_iter()
        .map(|(name, url)| (name.to_string(), url.to_string()))
        .collect();

        Ok(Self {
            http_client,
            sources,
        })
    }

    /// Overrides the upstream URL for a resource (allows testing against a local server)
    pub fn with_source(mut self, name: &str, url: impl Into<String>) -> Self {
        self.sources.insert(name.to_string(), url.into());
        self
    }

    /// Returns the upstream URL for a resource, if it has one
    pub fn source_for(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Downloads a plain-text list and returns its entries
    async fn fetch_list(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let entries = parse_plain_list(&body);
        if entries.is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }
        Ok(entries)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, definition: &ResourceDefinition) -> Result<Value, FetchError> {
        // Plain-text lists carry no `{name, url}` records, so keyed resources have no source.
        let url = match definition.shape {
            Shape::FlatList => self.source_for(definition.name),
            Shape::KeyedList { .. } => None,
        }
        .ok_or_else(|| FetchError::NoUpstream(definition.name.to_string()))?;

        debug!(resource = definition.name, url, "fetching upstream list");
        let entries = self.fetch_list(url).await?;
        debug!(resource = definition.name, count = entries.len(), "fetched upstream list");

        Ok(Value::from(entries))
    }
}

/// Fetcher selected from a [`Config`]
#[derive(Debug, Clone)]
pub enum ConfiguredFetcher {
    /// Network access enabled
    Http(HttpFetcher),
    /// Network access disabled
    Offline(OfflineFetcher),
}

impl ConfiguredFetcher {
    /// Builds the fetcher matching the config's offline setting
    ///
    /// Falls back to [`OfflineFetcher`] if the HTTP client cannot be built, so
    /// a refresh always yields one result per resource.
    pub fn from_config(config: &Config) -> Self {
        if config.offline {
            return Self::Offline(OfflineFetcher);
        }
        Self::http_or_offline(HttpFetcher::new(config.request_timeout))
    }

    fn http_or_offline(built: Result<HttpFetcher, FetchError>) -> Self {
        match built {
            Ok(fetcher) => Self::Http(fetcher),
            Err(e) => {
                warn!(error = %e, "HTTP client unavailable, refreshing from fallback data only");
                Self::Offline(OfflineFetcher)
            }
        }
    }
}

impl Fetcher for ConfiguredFetcher {
    async fn fetch(&self, definition: &ResourceDefinition) -> Result<Value, FetchError> {
        match self {
            Self::Http(fetcher) => fetcher.fetch(definition).await,
            Self::Offline(fetcher) => fetcher.fetch(definition).await,
        }
    }
}

/// Parses a newline-separated list
///
/// Blank lines and `#` comments are dropped, entries are trimmed and
/// lowercased, and duplicates are removed keeping the first occurrence.
pub fn parse_plain_list(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
