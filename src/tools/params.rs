//! Argument schemas for in-process tools.

use serde_json::{json, Map, Value};

/// Schema for a tool that takes no arguments.
pub fn no_parameters() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Builds an object schema whose properties are all strings, which is all
/// the tree tools need.
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A required string argument.
    pub fn string(mut self, name: &str, description: &str) -> Self {
        self.required.push(name.to_string());
        self.optional_string(name, description)
    }

    pub fn optional_string(mut self, name: &str, description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({ "type": "string", "description": description }),
        );
        self
    }

    pub fn build(self) -> Value {
        let mut schema = json!({ "type": "object", "properties": self.properties });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_list_only_names_required_strings() {
        let schema = ParameterBuilder::new()
            .string("config_key", "Key")
            .string("value", "New value")
            .optional_string("note", "Optional note")
            .build();
        assert_eq!(schema["required"], json!(["config_key", "value"]));
        assert_eq!(schema["properties"]["note"]["type"], "string");
    }

    #[test]
    fn all_optional_schema_has_no_required_key() {
        let schema = ParameterBuilder::new()
            .optional_string("image_path", "Photo")
            .build();
        assert!(schema.get("required").is_none());
    }
}
