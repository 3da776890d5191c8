//! delivcache library
//!
//! Keeps a local, disk-backed cache of email-deliverability reference datasets
//! (disposable domains, DNS blocklists, TLDs, IP-reputation providers) and
//! guarantees a usable copy of each at all times through built-in fallback
//! data.

pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod refresh;
pub mod report;
pub mod resources;

use std::collections::BTreeMap;

use cache::CacheStore;
use config::Config;
use fetch::ConfiguredFetcher;
use refresh::{RefreshEngine, RefreshResult};
use report::{DebugInfo, Reporter};

/// Describes the cached state of one resource without modifying it
pub fn debug_resource(config: &Config, name: &str) -> DebugInfo {
    Reporter::new(CacheStore::new(config.cache_dir.clone())).debug(name)
}

/// Refreshes every registered resource, returning one result per resource name
pub async fn update_deliverability_resources(config: &Config) -> BTreeMap<String, RefreshResult> {
    let fetcher = ConfiguredFetcher::from_config(config);
    let engine = RefreshEngine::new(CacheStore::new(config.cache_dir.clone()), fetcher);
    engine.refresh_all().await
}
