//! Configuration validation against a [`Schema`].
//!
//! # Example
//!
//! ```
//! use hemmer_provider_bitlaunch::schema::{Attribute, Schema};
//! use hemmer_provider_bitlaunch::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("host", Attribute::required_string().with_one_of(["Vultr", "Linode"]))
//!     .with_attribute("cpu_count", Attribute::optional_int64());
//!
//! assert!(validate(&schema, &json!({"host": "Vultr", "cpu_count": 2})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"host": "Hetzner"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("host".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use serde_json::Value;
use std::collections::HashMap;

/// Validate a JSON configuration against a schema.
///
/// Returns one diagnostic per problem; an empty list means the value is valid.
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes are skipped
/// - Attribute types must match, recursively for lists and objects
/// - String attributes with `one_of` must hold one of the listed values
/// - Every `at_least_one_of` group must have a non-null member
/// - Keys the schema does not know are rejected
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return diagnostics,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        },
    };

    // Sorted so diagnostics come out in a stable order.
    let mut names: Vec<&String> = schema.block.attributes.keys().collect();
    names.sort();
    for name in names {
        let attr = &schema.block.attributes[name];
        validate_attribute(attr, obj.get(name.as_str()), name, &mut diagnostics);
    }

    for group in &schema.block.at_least_one_of {
        let present = group
            .iter()
            .any(|name| obj.get(name).is_some_and(|v| !v.is_null()));
        if !present {
            diagnostics.push(
                Diagnostic::error(format!("Require one of {}", group.join(", ")))
                    .with_detail(format!(
                        "At least one of `{}` must be specified",
                        group.join(",")
                    ))
                    .with_attribute(group.first().cloned().unwrap_or_default()),
            );
        }
    }

    let mut unknown: Vec<&String> = obj
        .keys()
        .filter(|key| !schema.block.attributes.contains_key(key.as_str()))
        .collect();
    unknown.sort();
    for key in unknown {
        diagnostics.push(
            Diagnostic::error(format!("Unsupported attribute '{}'", key))
                .with_detail("An attribute with this name is not expected here")
                .with_attribute(key.as_str()),
        );
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !attr.is_configurable() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before && !attr.one_of.is_empty() {
                validate_one_of(&attr.one_of, v, path, diagnostics);
            }
        },
    }
}

fn validate_one_of(allowed: &[String], value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let matches = value
        .as_str()
        .is_some_and(|s| allowed.iter().any(|a| a == s));
    if !matches {
        diagnostics.push(
            Diagnostic::error(format!(
                "\"{}\" must be one of {}",
                path,
                allowed.join(", ")
            ))
            .with_detail(format!("Got {}", value))
            .with_attribute(path),
        );
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        },
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        let attr_path = format!("{}.{}", path, name);
        if let Some(value) = obj.get(name) {
            if !value.is_null() {
                validate_attribute_type(attr_type, value, &attr_path, diagnostics);
            }
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.as_f64().is_some_and(|f| {
                    f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
                })
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        ))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Schema};
    use serde_json::json;

    fn size_schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "host",
                Attribute::required_string().with_one_of(["DigitalOcean", "Vultr"]),
            )
            .with_attribute("cpu_count", Attribute::optional_int64())
            .with_attribute("disk_gb", Attribute::optional_int64())
            .with_attribute("slug", Attribute::computed_string())
            .with_at_least_one_of(&["cpu_count", "disk_gb"])
    }

    #[test]
    fn test_valid_config() {
        let diagnostics = validate(&size_schema(), &json!({"host": "Vultr", "cpu_count": 2}));
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_missing_required() {
        let diagnostics = validate(&size_schema(), &json!({"cpu_count": 2}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("host".to_string()));
        assert!(diagnostics[0].summary.contains("Missing required"));
    }

    #[test]
    fn test_one_of_rejects_unknown_value() {
        let diagnostics = validate(&size_schema(), &json!({"host": "Hetzner", "cpu_count": 2}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].summary,
            "\"host\" must be one of DigitalOcean, Vultr"
        );
    }

    #[test]
    fn test_one_of_skipped_on_type_error() {
        let diagnostics = validate(&size_schema(), &json!({"host": 4, "cpu_count": 2}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_at_least_one_of() {
        let diagnostics = validate(&size_schema(), &json!({"host": "Vultr"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Require one of cpu_count, disk_gb");

        // null does not count as set
        let diagnostics = validate(
            &size_schema(),
            &json!({"host": "Vultr", "cpu_count": null, "disk_gb": 50}),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_computed_attribute_skipped() {
        let diagnostics = validate(
            &size_schema(),
            &json!({"host": "Vultr", "cpu_count": 1, "slug": 123}),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_attribute() {
        let diagnostics = validate(
            &size_schema(),
            &json!({"host": "Vultr", "cpu_count": 1, "memory": 1024}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("memory".to_string()));
    }

    #[test]
    fn test_int64() {
        let schema = Schema::v0().with_attribute("count", Attribute::optional_int64());

        assert!(is_valid(&schema, &json!({"count": 42})));
        assert!(is_valid(&schema, &json!({"count": 42.0})));
        assert!(!is_valid(&schema, &json!({"count": 42.5})));
        assert!(!is_valid(&schema, &json!({"count": "42"})));
    }

    #[test]
    fn test_list_elements() {
        let schema = Schema::v0().with_attribute(
            "ssh_keys",
            Attribute::new(
                AttributeType::list(AttributeType::String),
                AttributeFlags::optional(),
            ),
        );

        assert!(is_valid(&schema, &json!({"ssh_keys": ["a", "b"]})));
        assert!(is_valid(&schema, &json!({"ssh_keys": []})));

        let diagnostics = validate(&schema, &json!({"ssh_keys": ["a", 7]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("ssh_keys.1".to_string()));

        assert!(!is_valid(&schema, &json!({"ssh_keys": "a"})));
    }

    #[test]
    fn test_object_elements() {
        let schema = Schema::v0().with_attribute(
            "disk",
            Attribute::new(
                AttributeType::object([
                    ("type", AttributeType::String),
                    ("count", AttributeType::Int64),
                ]),
                AttributeFlags::optional(),
            ),
        );

        assert!(is_valid(&schema, &json!({"disk": {"type": "SSD", "count": 1}})));

        let diagnostics = validate(&schema, &json!({"disk": {"type": "SSD", "count": "one"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("disk.count".to_string()));
    }

    #[test]
    fn test_root_not_object() {
        let diagnostics = validate(&size_schema(), &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));

        assert!(validate(&size_schema(), &Value::Null).is_empty());
    }

    #[test]
    fn test_validate_result_helper() {
        assert!(validate_result(&size_schema(), &json!({"host": "Vultr", "disk_gb": 25})).is_ok());

        let result = validate_result(&size_schema(), &json!({}));
        // missing host and the cpu_count/disk_gb group
        assert_eq!(result.unwrap_err().len(), 2);
    }
}
