//! Structural validation of cached resource content
//!
//! Upstream sources occasionally hand back payloads that parse fine but are
//! useless (truncated lists, an empty provider directory). Validation catches
//! those states as well as plain shape mismatches.

use serde_json::Value;
use thiserror::Error;

use super::{ResourceDefinition, Shape};

/// Reasons a resource's content is not usable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
    /// No content was available
    #[error("content is missing")]
    Missing,

    /// Content is not the JSON type the shape requires
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    /// A keyed list is missing its required key
    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    /// A keyed list holds no records
    #[error("'{0}' is empty")]
    Empty(&'static str),

    /// Fewer entries than the resource's minimum
    #[error("only {actual} items, at least {min} required")]
    TooSmall { actual: usize, min: usize },
}

/// Returns a short name for the JSON type of `value`
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates `content` against a resource definition
///
/// Rules are applied in order: presence, shape, required key, emptiness,
/// then minimum size.
///
/// # Returns
/// * `Ok(item_count)` if the content is usable
/// * `Err(Invalid)` describing the first rule that failed
pub fn validate(content: Option<&Value>, definition: &ResourceDefinition) -> Result<usize, Invalid> {
    let content = content.ok_or(Invalid::Missing)?;

    let entries = match definition.shape {
        Shape::FlatList => content.as_array().ok_or(Invalid::WrongType {
            expected: "array",
            found: json_type_name(content),
        })?,
        Shape::KeyedList { key } => {
            let map = content.as_object().ok_or(Invalid::WrongType {
                expected: "object",
                found: json_type_name(content),
            })?;
            let value = map.get(key).ok_or(Invalid::MissingKey(key))?;
            let entries = value.as_array().ok_or(Invalid::WrongType {
                expected: "array",
                found: json_type_name(value),
            })?;
            if entries.is_empty() {
                return Err(Invalid::Empty(key));
            }
            entries
        }
    };

    if entries.len() < definition.min_items {
        return Err(Invalid::TooSmall {
            actual: entries.len(),
            min: definition.min_items,
        });
    }

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(min_items: usize) -> ResourceDefinition {
        ResourceDefinition {
            name: "flat_test",
            shape: Shape::FlatList,
            min_items,
            fallback: json!([]),
        }
    }

    fn keyed(min_items: usize) -> ResourceDefinition {
        ResourceDefinition {
            name: "keyed_test",
            shape: Shape::KeyedList { key: "providers" },
            min_items,
            fallback: json!({"providers": []}),
        }
    }

    #[test]
    fn test_missing_content() {
        assert_eq!(validate(None, &flat(0)), Err(Invalid::Missing));
        assert_eq!(validate(None, &keyed(0)), Err(Invalid::Missing));
    }

    #[test]
    fn test_flat_list_wrong_type() {
        let result = validate(Some(&json!({"a": 1})), &flat(0));
        assert_eq!(
            result,
            Err(Invalid::WrongType {
                expected: "array",
                found: "object"
            })
        );
    }

    #[test]
    fn test_flat_list_too_small() {
        let result = validate(Some(&json!(["a", "b"])), &flat(3));
        assert_eq!(result, Err(Invalid::TooSmall { actual: 2, min: 3 }));
    }

    #[test]
    fn test_flat_list_valid_returns_count() {
        assert_eq!(validate(Some(&json!(["a", "b", "c"])), &flat(3)), Ok(3));
    }

    #[test]
    fn test_empty_flat_list_allowed_with_zero_minimum() {
        assert_eq!(validate(Some(&json!([])), &flat(0)), Ok(0));
    }

    #[test]
    fn test_keyed_list_wrong_type() {
        let result = validate(Some(&json!(["providers"])), &keyed(0));
        assert!(matches!(result, Err(Invalid::WrongType { expected: "object", .. })));
    }

    #[test]
    fn test_keyed_list_missing_key() {
        let result = validate(Some(&json!({"other": [1]})), &keyed(0));
        assert_eq!(result, Err(Invalid::MissingKey("providers")));
    }

    #[test]
    fn test_keyed_list_value_not_array() {
        let result = validate(Some(&json!({"providers": "nope"})), &keyed(0));
        assert_eq!(
            result,
            Err(Invalid::WrongType {
                expected: "array",
                found: "string"
            })
        );
    }

    #[test]
    fn test_keyed_list_empty_checked_before_size() {
        let result = validate(Some(&json!({"providers": []})), &keyed(5));
        assert_eq!(result, Err(Invalid::Empty("providers")));
    }

    #[test]
    fn test_keyed_list_too_small() {
        let result = validate(Some(&json!({"providers": [{}, {}]})), &keyed(5));
        assert_eq!(result, Err(Invalid::TooSmall { actual: 2, min: 5 }));
    }

    #[test]
    fn test_keyed_list_valid() {
        let content = json!({"providers": [{"name": "A", "url": "https://a/"}]});
        assert_eq!(validate(Some(&content), &keyed(1)), Ok(1));
    }

    #[test]
    fn test_invalid_display() {
        let err = Invalid::TooSmall { actual: 3, min: 30 };
        assert_eq!(err.to_string(), "only 3 items, at least 30 required");
    }
}
