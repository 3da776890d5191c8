use std::fs;

use serde_json::Value;

/// Fallback files and the key their records live under, if any
const FALLBACKS: [(&str, Option<&str>); 4] = [
    ("disposable_domains", None),
    ("dnsbl_list", None),
    ("tld_list", None),
    ("ip_reputation_providers", Some("providers")),
];

fn main() {
    for (name, key) in FALLBACKS {
        let path = format!("fallback/{}.json", name);
        println!("cargo:rerun-if-changed={}", path);

        let raw = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {}", path, e));
        let content: Value = serde_json::from_str(&raw)
            .unwrap_or_else(|e| panic!("{} is not valid JSON: {}", path, e));

        let entries = match key {
            None => content.as_array(),
            Some(key) => content.get(key).and_then(Value::as_array),
        };
        match entries {
            Some(entries) if !entries.is_empty() => {}
            _ => panic!("{} must hold a non-empty list", path),
        }
    }
    println!("cargo:rerun-if-changed=build.rs");
}
