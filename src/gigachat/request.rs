//! Request assembly.
//!
//! Merges model defaults, per-call options and free-form extra parameters
//! into a concrete request body, field by field. Precedence: defaults <
//! per-call options < extra parameters.

use std::collections::HashMap;

use crate::error::LlmError;
use crate::gigachat::wire::{ChatRequestBody, FunctionCallPolicy, FunctionSpec, GigaChatMessage};
use crate::types::CallOptions;

pub const DEFAULT_MODEL: &str = "GigaChat";

/// Model-level generation defaults.
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
    pub update_interval: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    /// Whether `generate` internally streams and folds the chunks
    pub streaming: bool,
    pub extra_params: HashMap<String, serde_json::Value>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            repetition_penalty: None,
            update_interval: None,
            stop_sequences: None,
            streaming: false,
            extra_params: HashMap::new(),
        }
    }
}

/// Build the chat request body.
///
/// Fails before any network activity when stop sequences are configured on
/// both the model and the call options.
pub fn build_chat_request(
    params: &ModelParams,
    messages: Vec<GigaChatMessage>,
    functions: Option<Vec<FunctionSpec>>,
    function_call: Option<FunctionCallPolicy>,
    options: Option<&CallOptions>,
    stream: bool,
) -> Result<ChatRequestBody, LlmError> {
    if params.model.is_empty() {
        return Err(LlmError::ConfigurationError(
            "model name cannot be empty".to_string(),
        ));
    }

    if params.stop_sequences.is_some() && options.map_or(false, |o| o.stop.is_some()) {
        return Err(LlmError::ConfigurationError(
            "stop sequences configured on both the model and the call options".to_string(),
        ));
    }

    let mut extra = serde_json::Map::new();
    for (key, value) in &params.extra_params {
        extra.insert(key.clone(), value.clone());
    }
    if let Some(options) = options {
        for (key, value) in &options.extra_params {
            extra.insert(key.clone(), value.clone());
        }
    }

    let opt = |f: fn(&CallOptions) -> Option<f32>, default: Option<f32>| {
        options.and_then(f).or(default)
    };

    Ok(ChatRequestBody {
        model: params.model.clone(),
        messages,
        functions,
        function_call,
        temperature: opt(|o| o.temperature, params.temperature),
        top_p: opt(|o| o.top_p, params.top_p),
        max_tokens: options
            .and_then(|o| o.max_tokens)
            .or(params.max_tokens),
        repetition_penalty: opt(|o| o.repetition_penalty, params.repetition_penalty),
        update_interval: opt(|o| o.update_interval, params.update_interval),
        stop_sequences: options
            .and_then(|o| o.stop.clone())
            .or_else(|| params.stop_sequences.clone()),
        stream,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conflicting_stop_sequences_fail_before_network() {
        let params = ModelParams {
            stop_sequences: Some(vec!["END".to_string()]),
            ..Default::default()
        };
        let options = CallOptions::new().with_stop(vec!["STOP".to_string()]);

        let result = build_chat_request(&params, vec![], None, None, Some(&options), false);
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn call_options_override_model_defaults() {
        let params = ModelParams {
            temperature: Some(0.2),
            max_tokens: Some(100),
            ..Default::default()
        };
        let options = CallOptions::new().with_temperature(0.9);

        let body =
            build_chat_request(&params, vec![], None, None, Some(&options), false).unwrap();
        assert_eq!(body.temperature, Some(0.9));
        assert_eq!(body.max_tokens, Some(100));
    }

    #[test]
    fn extra_params_override_everything() {
        let mut params = ModelParams::default();
        params
            .extra_params
            .insert("profanity_check".to_string(), json!(true));
        let options = CallOptions::new().with_extra_param("profanity_check", json!(false));

        let body =
            build_chat_request(&params, vec![], None, None, Some(&options), false).unwrap();
        assert_eq!(body.extra.get("profanity_check"), Some(&json!(false)));
    }

    #[test]
    fn stream_flag_is_always_materialized() {
        let body = build_chat_request(&ModelParams::default(), vec![], None, None, None, true)
            .unwrap();
        assert!(body.stream);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], json!(true));
    }

    #[test]
    fn model_stop_sequences_used_when_no_call_override() {
        let params = ModelParams {
            stop_sequences: Some(vec!["END".to_string()]),
            ..Default::default()
        };
        let body = build_chat_request(&params, vec![], None, None, None, false).unwrap();
        assert_eq!(body.stop_sequences, Some(vec!["END".to_string()]));
    }
}
