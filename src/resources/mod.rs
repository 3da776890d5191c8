//! Resource definitions for the deliverability cache
//!
//! This module contains the types describing each cached reference dataset:
//! its name, the JSON shape it is stored in, how many items it must hold to be
//! considered usable, and the built-in fallback data used when nothing better
//! is available.

pub mod registry;
pub mod validate;

pub use registry::{all_resources, get_resource_by_name};
pub use validate::{validate, Invalid};

use serde::Serialize;
use serde_json::Value;

/// Shape of the JSON document stored for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// A top-level array of entries (e.g. blocklist hostnames)
    FlatList,
    /// An object holding one required key whose value is an array of records
    KeyedList {
        /// The key the records live under (e.g. `"providers"`)
        key: &'static str,
    },
}

/// Static description of one cached resource
///
/// Definitions are built once from the registry and never change while the
/// process runs. Each resource name maps to exactly one definition.
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    /// Unique resource name, also the cache file stem
    pub name: &'static str,
    /// Expected JSON shape
    pub shape: Shape,
    /// Minimum number of entries for the content to be usable
    pub min_items: usize,
    /// Built-in dataset written when the cache cannot be refreshed from upstream
    pub fallback: Value,
}

impl ResourceDefinition {
    /// Returns the entries of `content` according to this definition's shape
    ///
    /// Returns `None` if the content does not have the expected shape.
    pub fn entries<'a>(&self, content: &'a Value) -> Option<&'a Vec<Value>> {
        match self.shape {
            Shape::FlatList => content.as_array(),
            Shape::KeyedList { key } => content.get(key)?.as_array(),
        }
    }

    /// Number of entries held by `content`, or 0 if it has the wrong shape
    pub fn item_count(&self, content: &Value) -> usize {
        self.entries(content).map_or(0, Vec::len)
    }

    /// Number of entries in the built-in fallback dataset
    pub fn fallback_count(&self) -> usize {
        self.item_count(&self.fallback)
    }
}
