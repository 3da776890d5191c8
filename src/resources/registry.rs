//! Built-in registry of deliverability resources
//!
//! Fallback datasets are versioned JSON files under `fallback/` and are
//! embedded into the binary at build time, so a usable copy of every resource
//! is always available without network access.

use std::sync::OnceLock;

use serde_json::Value;
use tracing::error;

use super::{ResourceDefinition, Shape};

/// Names of every supported resource, in registry order
pub const RESOURCE_NAMES: [&str; 4] = [
    "disposable_domains",
    "dnsbl_list",
    "tld_list",
    "ip_reputation_providers",
];

const DISPOSABLE_DOMAINS: &str = include_str!("../../fallback/disposable_domains.json");
const DNSBL_LIST: &str = include_str!("../../fallback/dnsbl_list.json");
const TLD_LIST: &str = include_str!("../../fallback/tld_list.json");
const IP_REPUTATION_PROVIDERS: &str = include_str!("../../fallback/ip_reputation_providers.json");

static REGISTRY: OnceLock<Vec<ResourceDefinition>> = OnceLock::new();

fn embedded(name: &str, raw: &str) -> Value {
    // build.rs rejects fallback files that do not parse, so this never falls through.
    serde_json::from_str(raw).unwrap_or_else(|e| {
        error!(resource = name, error = %e, "embedded fallback is not valid JSON");
        Value::Null
    })
}

fn build() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            name: "disposable_domains",
            shape: Shape::FlatList,
            min_items: 20,
            fallback: embedded("disposable_domains", DISPOSABLE_DOMAINS),
        },
        ResourceDefinition {
            name: "dnsbl_list",
            shape: Shape::FlatList,
            min_items: 36,
            fallback: embedded("dnsbl_list", DNSBL_LIST),
        },
        ResourceDefinition {
            name: "tld_list",
            shape: Shape::FlatList,
            min_items: 100,
            fallback: embedded("tld_list", TLD_LIST),
        },
        ResourceDefinition {
            name: "ip_reputation_providers",
            shape: Shape::KeyedList { key: "providers" },
            min_items: 10,
            fallback: embedded("ip_reputation_providers", IP_REPUTATION_PROVIDERS),
        },
    ]
}

/// Returns every registered resource definition
pub fn all_resources() -> &'static [ResourceDefinition] {
    REGISTRY.get_or_init(build)
}

/// Looks up a resource definition by name
///
/// # Returns
/// * `Some(&ResourceDefinition)` if the resource is registered
/// * `None` otherwise
pub fn get_resource_by_name(name: &str) -> Option<&'static ResourceDefinition> {
    all_resources().iter().find(|definition| definition.name == name)
}
