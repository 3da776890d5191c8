//! Refresh engine for cached deliverability resources
//!
//! For each resource the engine loads the cached document, validates it, and
//! only when it is missing or unusable asks the upstream fetcher for a
//! replacement, falling back to the built-in dataset when that fails. A valid
//! cache is never rewritten, so repeated refreshes converge to `Unchanged`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::fetch::Fetcher;
use crate::resources::{all_resources, validate, ResourceDefinition};

/// Outcome of refreshing one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    /// The cache was already valid and was left untouched
    Unchanged,
    /// The built-in fallback dataset was written
    FallbackApplied,
    /// Fresh upstream content was written
    Updated,
    /// The resource could not be refreshed
    Error,
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unchanged => "unchanged",
            Self::FallbackApplied => "fallback_applied",
            Self::Updated => "updated",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Result of a refresh for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResult {
    /// Resource that was refreshed
    pub resource_name: String,
    /// Number of entries now cached (0 on error)
    pub item_count: usize,
    /// What the refresh did
    pub status: RefreshStatus,
    /// Why the cache was replaced, or why the refresh failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RefreshResult {
    fn error(resource_name: &str, detail: String) -> Self {
        Self {
            resource_name: resource_name.to_string(),
            item_count: 0,
            status: RefreshStatus::Error,
            detail: Some(detail),
        }
    }
}

/// Errors returned by [`RefreshEngine::refresh`]
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The resource name is not in the registry
    #[error("unknown resource: '{0}'")]
    UnknownResource(String),
}

/// Reconciles cached resources against upstream content or fallback data
///
/// The engine is the only writer of the cache store.
#[derive(Debug, Clone)]
pub struct RefreshEngine<F> {
    store: CacheStore,
    fetcher: F,
    definitions: Cow<'static, [ResourceDefinition]>,
}

impl<F: Fetcher> RefreshEngine<F> {
    /// Creates an engine over every registered resource
    pub fn new(store: CacheStore, fetcher: F) -> Self {
        Self {
            store,
            fetcher,
            definitions: Cow::Borrowed(all_resources()),
        }
    }

    /// Creates an engine over a custom set of resource definitions
    pub fn with_definitions(
        store: CacheStore,
        fetcher: F,
        definitions: Vec<ResourceDefinition>,
    ) -> Self {
        Self {
            store,
            fetcher,
            definitions: Cow::Owned(definitions),
        }
    }

    /// Returns the cache store this engine writes to
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the resource definitions this engine manages
    pub fn definitions(&self) -> &[ResourceDefinition] {
        &self.definitions
    }

    /// Refreshes a single resource by name
    ///
    /// # Returns
    /// * `Ok(RefreshResult)` describing the outcome, including `Error` outcomes
    /// * `Err(RefreshError::UnknownResource)` if the name is not registered
    pub async fn refresh(&self, name: &str) -> Result<RefreshResult, RefreshError> {
        let definition = self
            .definitions
            .iter()
            .find(|definition| definition.name == name)
            .ok_or_else(|| RefreshError::UnknownResource(name.to_string()))?;
        Ok(self.refresh_definition(definition).await)
    }

    /// Refreshes every resource, one result per resource name
    ///
    /// Resources are independent: each owns its own cache file, so a failure
    /// on one never affects the others.
    pub async fn refresh_all(&self) -> BTreeMap<String, RefreshResult> {
        let results = join_all(
            self.definitions
                .iter()
                .map(|definition| self.refresh_definition(definition)),
        )
        .await;

        results
            .into_iter()
            .map(|result| (result.resource_name.clone(), result))
            .collect()
    }

    async fn refresh_definition(&self, definition: &ResourceDefinition) -> RefreshResult {
        let name = definition.name;

        let cached = match self.store.load(name) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(resource = name, error = %e, "cached copy unavailable");
                None
            }
        };

        let reason = match validate(cached.as_ref(), definition) {
            Ok(item_count) => {
                debug!(resource = name, item_count, "cache is valid");
                return RefreshResult {
                    resource_name: name.to_string(),
                    item_count,
                    status: RefreshStatus::Unchanged,
                    detail: None,
                };
            }
            Err(reason) => reason,
        };
        info!(resource = name, %reason, "cache needs refresh");

        // A fetcher that panics is contained to its own resource.
        let fetched = AssertUnwindSafe(self.fetcher.fetch(definition))
            .catch_unwind()
            .await;

        let (content, status): (Cow<'_, Value>, RefreshStatus) = match fetched {
            Err(_) => {
                error!(resource = name, "upstream fetch panicked");
                return RefreshResult::error(name, "upstream fetch panicked".to_string());
            }
            Ok(Ok(content)) => match validate(Some(&content), definition) {
                Ok(_) => (Cow::Owned(content), RefreshStatus::Updated),
                Err(invalid) => {
                    warn!(resource = name, reason = %invalid, "fetched content unusable, applying fallback");
                    (Cow::Borrowed(&definition.fallback), RefreshStatus::FallbackApplied)
                }
            },
            Ok(Err(e)) => {
                warn!(resource = name, error = %e, "upstream fetch failed, applying fallback");
                (Cow::Borrowed(&definition.fallback), RefreshStatus::FallbackApplied)
            }
        };

        if status == RefreshStatus::FallbackApplied {
            if let Err(invalid) = validate(Some(&content), definition) {
                error!(resource = name, reason = %invalid, "fallback dataset unusable, keeping cache as is");
                return RefreshResult::error(name, format!("fallback dataset unusable: {}", invalid));
            }
        }

        if let Err(e) = self.store.save(name, &content) {
            error!(resource = name, error = %e, "failed to persist resource");
            return RefreshResult::error(name, e.to_string());
        }

        let item_count = definition.item_count(&content);
        info!(resource = name, item_count, %status, "resource refreshed");
        RefreshResult {
            resource_name: name.to_string(),
            item_count,
            status,
            detail: Some(reason.to_string()),
        }
    }
}
