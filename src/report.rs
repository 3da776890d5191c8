//! Introspection and reporting for cached resources
//!
//! Everything here is read-only except [`status_report`], which forces a
//! refresh cycle: verifying resources means refreshing them. Use
//! [`Reporter::inspect_all`] for a view that never writes.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheError, CacheFile, CacheStore};
use crate::fetch::Fetcher;
use crate::refresh::{RefreshEngine, RefreshResult};
use crate::resources::{all_resources, get_resource_by_name};

/// Number of keys or entries shown in `sample_keys`
const SAMPLE_SIZE: usize = 5;

/// JSON shape found in a cache file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedShape {
    /// No cache file exists
    Missing,
    /// The file could not be read
    Unreadable,
    /// The file is not valid JSON (possibly mid-write by another process)
    InvalidJson,
    /// A JSON array
    List,
    /// A JSON object
    Mapping,
    /// Any other JSON value
    Scalar,
}

/// Snapshot of one resource's cache state, for operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    pub resource_name: String,
    /// Location of the cache file, if the name is usable as a file stem
    pub path: Option<PathBuf>,
    pub exists: bool,
    pub byte_size: u64,
    pub shape_observed: ObservedShape,
    pub item_count: usize,
    /// Leading mapping keys, or leading list entries
    pub sample_keys: Vec<String>,
    /// Last modification time of the cache file
    pub modified: Option<DateTime<Utc>>,
}

impl DebugInfo {
    fn empty(resource_name: &str, path: Option<PathBuf>, shape_observed: ObservedShape) -> Self {
        Self {
            resource_name: resource_name.to_string(),
            path,
            exists: false,
            byte_size: 0,
            shape_observed,
            item_count: 0,
            sample_keys: Vec::new(),
            modified: None,
        }
    }
}

/// Read-only view over the cache store
#[derive(Debug, Clone)]
pub struct Reporter {
    store: CacheStore,
}

impl Reporter {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Describes the cached state of one resource without modifying it
    ///
    /// Never fails: unreadable or half-written files are reported through
    /// `shape_observed` instead.
    pub fn debug(&self, name: &str) -> DebugInfo {
        let path = match self.store.path_for(name) {
            Ok(path) => path,
            Err(_) => return DebugInfo::empty(name, None, ObservedShape::Unreadable),
        };

        let bytes = match self.store.read_raw(name) {
            Ok(bytes) => bytes,
            Err(CacheError::NotFound(_)) => {
                return DebugInfo::empty(name, Some(path), ObservedShape::Missing)
            }
            Err(_) => return DebugInfo::empty(name, Some(path), ObservedShape::Unreadable),
        };

        let modified = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let mut info = DebugInfo {
            resource_name: name.to_string(),
            path: Some(path),
            exists: true,
            byte_size: bytes.len() as u64,
            shape_observed: ObservedShape::InvalidJson,
            item_count: 0,
            sample_keys: Vec::new(),
            modified,
        };

        let Ok(content) = serde_json::from_slice::<Value>(&bytes) else {
            return info;
        };

        match &content {
            Value::Array(items) => {
                info.shape_observed = ObservedShape::List;
                info.item_count = items.len();
                info.sample_keys = items.iter().take(SAMPLE_SIZE).map(display_entry).collect();
            }
            Value::Object(map) => {
                info.shape_observed = ObservedShape::Mapping;
                info.item_count = match get_resource_by_name(name) {
                    Some(definition) => definition.item_count(&content),
                    None => map.len(),
                };
                info.sample_keys = map.keys().take(SAMPLE_SIZE).cloned().collect();
            }
            _ => info.shape_observed = ObservedShape::Scalar,
        }
        info
    }

    /// Describes every registered resource
    pub fn inspect_all(&self) -> Vec<DebugInfo> {
        all_resources()
            .iter()
            .map(|definition| self.debug(definition.name))
            .collect()
    }

    /// Lists the JSON files present in the cache directory
    pub fn cache_files(&self) -> Result<Vec<CacheFile>, CacheError> {
        self.store.list_files()
    }
}

/// Verifies every resource by forcing a refresh cycle
pub async fn status_report<F: Fetcher>(engine: &RefreshEngine<F>) -> BTreeMap<String, RefreshResult> {
    engine.refresh_all().await
}

fn display_entry(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Renders a DebugInfo as `key: value` lines
pub fn format_debug(info: &DebugInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ---", info.resource_name);
    if let Some(path) = &info.path {
        let _ = writeln!(out, "path: {}", path.display());
    }
    let _ = writeln!(out, "exists: {}", info.exists);
    let _ = writeln!(out, "byte_size: {}", info.byte_size);
    let shape = serde_json::to_value(info.shape_observed)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let _ = writeln!(out, "shape_observed: {}", shape);
    let _ = writeln!(out, "item_count: {}", info.item_count);
    let _ = writeln!(out, "sample_keys: [{}]", info.sample_keys.join(", "));
    if let Some(modified) = info.modified {
        let _ = writeln!(out, "modified: {}", modified.to_rfc3339());
    }
    out
}

/// Renders one refresh outcome as `name: N items (Status: s)`
pub fn format_refresh(result: &RefreshResult) -> String {
    let mut line = format!(
        "{}: {} items (Status: {})",
        result.resource_name, result.item_count, result.status
    );
    if let Some(detail) = &result.detail {
        let _ = write!(line, " [{}]", detail);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::OfflineFetcher;
    use crate::refresh::RefreshStatus;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_reporter() -> (Reporter, CacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CacheStore::new(temp_dir.path().to_path_buf());
        (Reporter::new(store.clone()), store, temp_dir)
    }

    #[test]
    fn test_debug_missing_file() {
        let (reporter, _store, _temp_dir) = create_reporter();

        let info = reporter.debug("dnsbl_list");

        assert!(!info.exists);
        assert_eq!(info.shape_observed, ObservedShape::Missing);
        assert_eq!(info.item_count, 0);
        assert!(info.path.is_some());
    }

    #[test]
    fn test_debug_invalid_json_does_not_fail() {
        let (reporter, _store, temp_dir) = create_reporter();
        fs::write(temp_dir.path().join("tld_list.json"), "[\"com\", \"or").unwrap();

        let info = reporter.debug("tld_list");

        assert!(info.exists);
        assert_eq!(info.shape_observed, ObservedShape::InvalidJson);
        assert_eq!(info.byte_size, 11);
        assert!(info.modified.is_some());
    }

    #[test]
    fn test_debug_list_samples_leading_entries() {
        let (reporter, store, _temp_dir) = create_reporter();
        store
            .save("tld_list", &json!(["com", "org", "net", "io", "dev", "app", "ai"]))
            .unwrap();

        let info = reporter.debug("tld_list");

        assert_eq!(info.shape_observed, ObservedShape::List);
        assert_eq!(info.item_count, 7);
        assert_eq!(info.sample_keys, vec!["com", "org", "net", "io", "dev"]);
    }

    #[test]
    fn test_debug_keyed_resource_counts_records() {
        let (reporter, store, _temp_dir) = create_reporter();
        store
            .save(
                "ip_reputation_providers",
                &json!({"providers": [{"name": "A"}, {"name": "B"}]}),
            )
            .unwrap();

        let info = reporter.debug("ip_reputation_providers");

        assert_eq!(info.shape_observed, ObservedShape::Mapping);
        assert_eq!(info.item_count, 2);
        assert_eq!(info.sample_keys, vec!["providers"]);
    }

    #[test]
    fn test_debug_unregistered_mapping_counts_keys() {
        let (reporter, store, _temp_dir) = create_reporter();
        store.save("custom", &json!({"a": 1, "b": 2, "c": 3})).unwrap();

        let info = reporter.debug("custom");

        assert_eq!(info.item_count, 3);
    }

    #[test]
    fn test_debug_scalar_document() {
        let (reporter, store, _temp_dir) = create_reporter();
        store.save("dnsbl_list", &json!(42)).unwrap();

        assert_eq!(reporter.debug("dnsbl_list").shape_observed, ObservedShape::Scalar);
    }

    #[test]
    fn test_debug_invalid_name() {
        let (reporter, _store, _temp_dir) = create_reporter();

        let info = reporter.debug("../outside");

        assert!(!info.exists);
        assert!(info.path.is_none());
        assert_eq!(info.shape_observed, ObservedShape::Unreadable);
    }

    #[test]
    fn test_debug_never_writes() {
        let (reporter, _store, temp_dir) = create_reporter();

        let infos = reporter.inspect_all();

        assert_eq!(infos.len(), all_resources().len());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_shape_serializes_snake_case() {
        let json = serde_json::to_string(&ObservedShape::InvalidJson).unwrap();
        assert_eq!(json, "\"invalid_json\"");
    }

    #[test]
    fn test_format_debug_lines() {
        let info = DebugInfo {
            resource_name: "dnsbl_list".to_string(),
            path: None,
            exists: true,
            byte_size: 10,
            shape_observed: ObservedShape::List,
            item_count: 2,
            sample_keys: vec!["a".to_string(), "b".to_string()],
            modified: None,
        };

        let text = format_debug(&info);

        assert!(text.starts_with("--- dnsbl_list ---\n"));
        assert!(text.contains("shape_observed: list\n"));
        assert!(text.contains("sample_keys: [a, b]\n"));
        assert!(!text.contains("modified"));
    }

    #[test]
    fn test_format_refresh_line() {
        let result = RefreshResult {
            resource_name: "tld_list".to_string(),
            item_count: 500,
            status: RefreshStatus::Unchanged,
            detail: None,
        };

        assert_eq!(format_refresh(&result), "tld_list: 500 items (Status: unchanged)");
    }

    #[tokio::test]
    async fn test_status_report_forces_refresh() {
        let (_reporter, store, temp_dir) = create_reporter();
        let engine = RefreshEngine::new(store, OfflineFetcher);

        let report = status_report(&engine).await;

        assert_eq!(report.len(), all_resources().len());
        assert!(report
            .values()
            .all(|r| r.status == RefreshStatus::FallbackApplied));
        assert!(temp_dir.path().join("dnsbl_list.json").exists());
    }
}
