use std::fs;
use std::path::Path;

use prost_reflect::{DeserializeOptions, DynamicMessage, Kind, MessageDescriptor};
use serde_json::Value;

use crate::error::{CfctlError, Result};

/// Merge parameter sources into one JSON object, per spec §4.5 precedence:
/// YAML file, then JSON blob, then repeated `key=value` pairs (later source
/// wins on key collision).
pub fn merge_params(file: Option<&Path>, json_blob: Option<&str>, kv_pairs: &[String]) -> Result<Value> {
    let mut merged = serde_json::Map::new();

    if let Some(path) = file {
        let contents = fs::read_to_string(path)?;
        let from_yaml: Value = serde_yaml::from_str(&contents)?;
        merge_into(&mut merged, from_yaml);
    }

    if let Some(blob) = json_blob {
        let from_json: Value = serde_json::from_str(blob)
            .map_err(|e| CfctlError::Proto(format!("invalid JSON parameter blob: {e}")))?;
        merge_into(&mut merged, from_json);
    }

    for pair in kv_pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| CfctlError::Proto(format!("parameter '{pair}' is not in key=value form")))?;
        merged.insert(key.to_string(), parse_kv_value(value));
    }

    Ok(Value::Object(merged))
}

fn merge_into(dest: &mut serde_json::Map<String, Value>, src: Value) {
    if let Value::Object(map) = src {
        for (k, v) in map {
            dest.insert(k, v);
        }
    }
}

/// Parse a `key=value` right-hand side into a typed JSON value: a full JSON
/// document where the value parses as one (arrays, objects, booleans,
/// numbers), a string otherwise.
fn parse_kv_value(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str(raw) {
        return value;
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(f) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}

/// Validate that every key in `value` names a field on `desc`, recursing
/// into nested message-typed fields. Per spec §4.5, a parameter that does
/// not name a field on the target message is rejected rather than ignored.
pub fn validate_fields(desc: &MessageDescriptor, value: &Value) -> Result<()> {
    let Value::Object(map) = value else {
        return Ok(());
    };

    for (key, nested) in map {
        let field = desc
            .get_field_by_name(key)
            .or_else(|| desc.get_field_by_json_name(key));

        let Some(field) = field else {
            let mut valid: Vec<String> = desc.fields().map(|f| f.json_name().to_string()).collect();
            valid.sort();
            valid.dedup();
            return Err(CfctlError::UnknownField {
                name: key.clone(),
                valid,
            });
        };

        if let Kind::Message(nested_desc) = field.kind() {
            if field.is_list() {
                if let Value::Array(items) = nested {
                    for item in items {
                        validate_fields(&nested_desc, item)?;
                    }
                }
            } else {
                validate_fields(&nested_desc, nested)?;
            }
        }
    }

    Ok(())
}

/// Bind merged parameters into a request message, rejecting unknown fields
/// up front rather than letting the server reject the whole call.
pub fn bind(desc: &MessageDescriptor, params: Value) -> Result<DynamicMessage> {
    validate_fields(desc, &params)?;

    let options = DeserializeOptions::new().deny_unknown_fields(true);
    DynamicMessage::deserialize_with_options(desc.clone(), params, &options)
        .map_err(|e| CfctlError::Proto(format!("failed to bind request parameters: {e}")))
}
