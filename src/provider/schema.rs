//! Tool parameter schema cleanup for Gemini function declarations.

use serde_json::Value;

// Keywords Gemini's OpenAPI subset rejects in function declarations.
const UNSUPPORTED_KEYWORDS: &[&str] = &["$schema", "additionalProperties", "title", "definitions", "$defs"];

/// Normalize a JSON schema so Gemini accepts it as function parameters.
///
/// Schemas generated by `schemars` (the MCP server side) carry `$schema`,
/// `title` and `additionalProperties`, none of which the API allows.
pub fn normalize_for_gemini(schema: &Value) -> Value {
    match schema {
        Value::Object(obj) => {
            let mut normalized = serde_json::Map::new();
            for (key, value) in obj {
                if UNSUPPORTED_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                let next = if key == "properties" {
                    normalize_properties(value)
                } else {
                    normalize_for_gemini(value)
                };
                normalized.insert(key.clone(), next);
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_for_gemini).collect()),
        _ => schema.clone(),
    }
}

// Property names are user data; only their schemas are normalized.
fn normalize_properties(properties: &Value) -> Value {
    match properties {
        Value::Object(props) => Value::Object(
            props
                .iter()
                .map(|(name, schema)| (name.clone(), normalize_for_gemini(schema)))
                .collect(),
        ),
        other => normalize_for_gemini(other),
    }
}

/// True when a schema declares no parameters at all. Gemini rejects an
/// object schema with empty `properties`, so such declarations omit it.
pub fn is_empty_object_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(obj) => obj
            .get("properties")
            .and_then(Value::as_object)
            .map_or(true, |props| props.is_empty()),
        _ => false,
    }
}
