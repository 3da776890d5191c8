//! Cache module for storing resource documents on disk
//!
//! This module provides a cache store that persists one JSON document per
//! resource in a configurable directory. It owns no validation logic; deciding
//! whether a document is usable is the job of the resources and refresh modules.

mod store;

pub use store::{CacheError, CacheFile, CacheStore};
