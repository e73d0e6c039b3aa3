//! Typed access to tool call arguments.

use crate::error::TinselError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, TinselError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| TinselError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    ///
    /// Some models send arguments as a JSON-encoded string; that form is
    /// accepted too, and an empty string means no arguments.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, TinselError> {
        let value = match &self.value {
            serde_json::Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
                        TinselError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
                    })?
                }
            }
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        serde_json::from_value(value).map_err(|e| {
            TinselError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }

    /// Arguments as a JSON object map, for forwarding to MCP.
    pub fn as_object(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        match self.deserialize::<serde_json::Value>().ok()? {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }
    }
}
