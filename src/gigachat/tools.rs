//! Tool definitions and their lowering to GigaChat function specs.

use crate::error::LlmError;
use crate::gigachat::wire::FunctionSpec;

/// Default function name for schema-backed definitions without one.
pub const DEFAULT_FUNCTION_NAME: &str = "extract";

/// A tool definition accepted by the adapter.
///
/// Inputs are classified once, up front; anything that fits neither variant
/// is rejected instead of being guessed at.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    /// Already in GigaChat function shape; lowered verbatim.
    Function(FunctionSpec),
    /// A bare JSON Schema describing the arguments.
    Schema {
        name: Option<String>,
        description: Option<String>,
        parameters: serde_json::Value,
    },
}

impl ToolInput {
    /// Classify a JSON value as a tool definition.
    ///
    /// A value with a string `name` and an object `parameters` is treated as
    /// vendor-shaped and passed through unchanged. A value that looks like a
    /// JSON Schema (`type` or `properties` present) becomes a schema-backed
    /// definition, taking its name from `title` when present.
    pub fn classify(value: serde_json::Value) -> Result<ToolInput, LlmError> {
        let obj = value.as_object().ok_or_else(|| {
            LlmError::InvalidInput(format!("tool definition must be an object, got: {value}"))
        })?;

        if is_vendor_shaped(obj) {
            let spec: FunctionSpec = serde_json::from_value(value)?;
            return Ok(ToolInput::Function(spec));
        }

        if obj.contains_key("type") || obj.contains_key("properties") {
            return Ok(schema_input(value));
        }

        Err(LlmError::InvalidInput(format!(
            "unsupported tool definition: {value}"
        )))
    }

    /// Classify a structured-output schema.
    ///
    /// Unlike [`ToolInput::classify`], any object that is not vendor-shaped
    /// is taken as a bare JSON Schema, so schemas without a `type` or
    /// `properties` key (`{}`, `anyOf`, `$ref`) still wrap into a function
    /// definition instead of being rejected.
    pub fn from_output_schema(value: serde_json::Value) -> Result<ToolInput, LlmError> {
        let obj = value.as_object().ok_or_else(|| {
            LlmError::InvalidInput(format!("output schema must be an object, got: {value}"))
        })?;

        if is_vendor_shaped(obj) {
            let spec: FunctionSpec = serde_json::from_value(value)?;
            return Ok(ToolInput::Function(spec));
        }

        Ok(schema_input(value))
    }

    /// The function name this definition will be published under.
    pub fn function_name(&self, default_name: &str) -> String {
        match self {
            ToolInput::Function(spec) => spec.name.clone(),
            ToolInput::Schema { name, .. } => name
                .clone()
                .unwrap_or_else(|| default_name.to_string()),
        }
    }

    /// Lower to a function spec.
    pub fn into_spec(self, default_name: &str) -> FunctionSpec {
        match self {
            ToolInput::Function(spec) => spec,
            ToolInput::Schema {
                name,
                description,
                parameters,
            } => FunctionSpec {
                name: name.unwrap_or_else(|| default_name.to_string()),
                description,
                parameters,
            },
        }
    }
}

fn is_vendor_shaped(obj: &serde_json::Map<String, serde_json::Value>) -> bool {
    obj.get("name").map_or(false, |v| v.is_string())
        && obj.get("parameters").map_or(false, |v| v.is_object())
}

fn schema_input(value: serde_json::Value) -> ToolInput {
    let obj = value.as_object();
    let name = obj
        .and_then(|o| o.get("title"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let description = obj
        .and_then(|o| o.get("description"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    ToolInput::Schema {
        name,
        description,
        parameters: value,
    }
}

/// Lower a list of tool definitions. An empty list lowers to `None`, never
/// to an empty vec.
pub fn convert_tools(inputs: Vec<ToolInput>) -> Option<Vec<FunctionSpec>> {
    if inputs.is_empty() {
        return None;
    }
    Some(
        inputs
            .into_iter()
            .map(|input| input.into_spec(DEFAULT_FUNCTION_NAME))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vendor_shaped_tool_passes_through_unchanged() {
        let value = json!({
            "name": "get_weather",
            "description": "Current weather for a city",
            "parameters": {
                "type": "object",
                "properties": {"city": {"type": "string"}},
            },
        });

        let first = ToolInput::classify(value.clone()).unwrap();
        let spec = match &first {
            ToolInput::Function(spec) => spec.clone(),
            other => panic!("expected vendor-shaped tool, got {other:?}"),
        };
        assert_eq!(spec.name, "get_weather");

        // Classifying the lowered spec again yields the same spec.
        let again = ToolInput::classify(serde_json::to_value(&spec).unwrap()).unwrap();
        assert_eq!(again, ToolInput::Function(spec));
    }

    #[test]
    fn json_schema_becomes_schema_backed_tool() {
        let value = json!({
            "title": "Person",
            "type": "object",
            "properties": {"name": {"type": "string"}},
        });

        let input = ToolInput::classify(value.clone()).unwrap();
        assert_eq!(input.function_name(DEFAULT_FUNCTION_NAME), "Person");
        let spec = input.into_spec(DEFAULT_FUNCTION_NAME);
        assert_eq!(spec.name, "Person");
        assert_eq!(spec.parameters, value);
    }

    #[test]
    fn untitled_schema_falls_back_to_default_name() {
        let input = ToolInput::classify(json!({"type": "object"})).unwrap();
        assert_eq!(input.function_name(DEFAULT_FUNCTION_NAME), "extract");
    }

    #[test]
    fn unclassifiable_values_are_rejected() {
        assert!(matches!(
            ToolInput::classify(json!("a string")),
            Err(LlmError::InvalidInput(_))
        ));
        assert!(matches!(
            ToolInput::classify(json!({"foo": "bar"})),
            Err(LlmError::InvalidInput(_))
        ));
    }

    #[test]
    fn output_schema_accepts_combinator_only_objects() {
        let input =
            ToolInput::from_output_schema(json!({"anyOf": [{"type": "string"}]})).unwrap();
        assert_eq!(input.function_name(DEFAULT_FUNCTION_NAME), "extract");

        let empty = ToolInput::from_output_schema(json!({})).unwrap();
        assert!(matches!(empty, ToolInput::Schema { .. }));

        // Non-objects are still rejected.
        assert!(matches!(
            ToolInput::from_output_schema(json!([1, 2])),
            Err(LlmError::InvalidInput(_))
        ));
    }

    #[test]
    fn output_schema_keeps_vendor_shape_intact() {
        let value = json!({
            "name": "get_weather",
            "parameters": {"type": "object"},
        });
        let input = ToolInput::from_output_schema(value).unwrap();
        assert_eq!(input.function_name(DEFAULT_FUNCTION_NAME), "get_weather");
    }

    #[test]
    fn empty_tool_list_lowers_to_none() {
        assert_eq!(convert_tools(vec![]), None);
    }
}
