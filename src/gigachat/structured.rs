//! Structured output on top of forced function calling.
//!
//! The model is bound to a single function and forced to call it; the call
//! arguments, validated against the caller's schema, are the structured
//! value. Function calling is the only supported method.

use std::sync::Arc;

use crate::error::LlmError;
use crate::gigachat::chat::GigaChatModel;
use crate::gigachat::tools::{DEFAULT_FUNCTION_NAME, ToolInput};
use crate::gigachat::wire::FunctionCallPolicy;
use crate::types::{CallOptions, ChatMessage};

/// Extraction method. Only `FunctionCalling` is supported; the others exist
/// so callers porting from JSON-mode providers get a clear error instead of
/// silent misbehavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredOutputMethod {
    FunctionCalling,
    JsonMode,
    JsonSchema,
}

/// Options for [`GigaChatModel::with_structured_output`].
#[derive(Debug, Clone, Default)]
pub struct StructuredOutputOptions {
    /// Function name; defaults to `extract`. A vendor-shaped schema keeps
    /// its own name.
    pub name: Option<String>,
    pub method: Option<StructuredOutputMethod>,
}

/// Raw model output paired with the extraction attempt.
#[derive(Debug, Clone)]
pub struct StructuredResult {
    pub raw: ChatMessage,
    /// `None` when extraction or validation failed
    pub parsed: Option<serde_json::Value>,
}

/// A chat model bound to produce structured output.
pub struct StructuredModel {
    model: GigaChatModel,
    validator: Arc<jsonschema::Validator>,
}

impl GigaChatModel {
    /// Bind this model to a structured-output schema.
    ///
    /// `schema` is either a vendor-shaped function definition (used as-is)
    /// or a bare JSON Schema wrapped into one; combinator-only schemas
    /// (`anyOf`, `$ref`, even `{}`) are accepted. The returned model forces
    /// a call to that single function on every invocation.
    pub fn with_structured_output(
        &self,
        schema: serde_json::Value,
        options: StructuredOutputOptions,
    ) -> Result<StructuredModel, LlmError> {
        if let Some(method) = options.method {
            if method != StructuredOutputMethod::FunctionCalling {
                return Err(LlmError::ConfigurationError(
                    "GigaChat only supports function calling as a structured output method"
                        .to_string(),
                ));
            }
        }

        let input = ToolInput::from_output_schema(schema)?;
        let default_name = options
            .name
            .unwrap_or_else(|| DEFAULT_FUNCTION_NAME.to_string());
        let name = input.function_name(&default_name);
        let spec = input.into_spec(&default_name);

        let validator = jsonschema::validator_for(&spec.parameters)
            .map_err(|e| LlmError::ConfigurationError(format!("invalid output schema: {e}")))?;

        let model = self
            .bind_tools(vec![ToolInput::Function(spec)])
            .with_function_call(FunctionCallPolicy::Named { name });

        Ok(StructuredModel {
            model,
            validator: Arc::new(validator),
        })
    }
}

impl StructuredModel {
    /// Invoke the model and extract the structured value. Extraction and
    /// validation failures are errors.
    pub async fn invoke(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
    ) -> Result<serde_json::Value, LlmError> {
        use crate::traits::ChatModel;
        let result = self.model.generate(messages, options).await?;
        self.extract(&result.message)
    }

    /// Invoke the model and return the raw message alongside the extraction
    /// attempt. A failed extraction downgrades to `parsed: None`.
    pub async fn invoke_with_raw(
        &self,
        messages: &[ChatMessage],
        options: Option<&CallOptions>,
    ) -> Result<StructuredResult, LlmError> {
        use crate::traits::ChatModel;
        let result = self.model.generate(messages, options).await?;
        let parsed = match self.extract(&result.message) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%error, "structured output extraction failed");
                None
            }
        };
        Ok(StructuredResult {
            raw: result.message,
            parsed,
        })
    }

    fn extract(&self, message: &ChatMessage) -> Result<serde_json::Value, LlmError> {
        let arguments = if let Some(call) = message.tool_calls.first() {
            call.arguments.clone()
        } else if let Some(record) = &message.metadata.function_call {
            match record.get("arguments") {
                Some(serde_json::Value::String(raw)) => serde_json::from_str(raw).map_err(|e| {
                    LlmError::ParseError(format!("function call arguments are not valid JSON: {e}"))
                })?,
                Some(value) => value.clone(),
                None => {
                    return Err(LlmError::ParseError(
                        "function call carried no arguments".to_string(),
                    ));
                }
            }
        } else {
            return Err(LlmError::ParseError(
                "model response contained no function call".to_string(),
            ));
        };

        if self.validator.validate(&arguments).is_err() {
            let mut msgs = Vec::new();
            for err in self.validator.iter_errors(&arguments) {
                msgs.push(format!("{} at {}", err, err.instance_path));
                if msgs.len() >= 3 {
                    break;
                }
            }
            return Err(LlmError::ParseError(format!(
                "structured output failed schema validation: {}",
                msgs.join("; ")
            )));
        }

        Ok(arguments)
    }
}
