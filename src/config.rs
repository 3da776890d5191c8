//! Runtime configuration for the deliverability cache
//!
//! The cache directory is an explicit value handed to the cache store and the
//! fetcher at construction, never read from ambient process state.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Project name used for the per-user cache directory
pub const PROJECT_NAME: &str = "email_deliverability";

/// Default timeout for a single upstream request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the refresh engine, the fetcher and the reporting facade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one `<resource>.json` per resource
    pub cache_dir: PathBuf,
    /// Never contact upstream sources; repair from fallback data only
    pub offline: bool,
    /// Timeout for each upstream request
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a Config using the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/email_deliverability/` on Linux, or the equivalent path
    /// on other platforms. Returns `None` if no home directory can be found.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", PROJECT_NAME)?;
        Some(Self::with_cache_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a Config rooted at a custom cache directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            offline: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Returns this config with offline mode set
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Returns this config with a different request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_cache_dir_defaults() {
        let config = Config::with_cache_dir(PathBuf::from("/tmp/delivcache"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/delivcache"));
        assert!(!config.offline);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::with_cache_dir(PathBuf::from("/tmp/x"))
            .offline(true)
            .request_timeout(Duration::from_secs(5));
        assert!(config.offline);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(config) = Config::new() {
            let path_str = config.cache_dir.to_string_lossy();
            assert!(
                path_str.contains(PROJECT_NAME),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
