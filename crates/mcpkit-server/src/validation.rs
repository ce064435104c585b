//! Argument validation: JSON-Schema for tool calls (§4.2.2), required/unknown
//! argument checks for prompts (§4.2.4).

use std::collections::HashMap;

use serde_json::Value;

use mcpkit_protocol::McpError;
use mcpkit_types::PromptArgument;

/// Validate `arguments` against a tool's JSON-Schema `input_schema`.
/// Returns `InvalidParams` with a `details.errors` array of `{path, message}`
/// on failure.
pub fn validate_tool_arguments(input_schema: &Value, arguments: &Value) -> mcpkit_protocol::Result<()> {
    let validator = jsonschema::validator_for(input_schema).map_err(|e| {
        McpError::internal(format!("tool has an invalid input schema: {e}")).into_box()
    })?;

    let errors: Vec<Value> = validator
        .iter_errors(arguments)
        .map(|e| {
            serde_json::json!({
                "path": e.instance_path.to_string(),
                "message": e.to_string(),
            })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(McpError::invalid_params("invalid tool arguments", serde_json::json!({"errors": errors})).into_box())
    }
}

/// Validate prompt arguments against its declared spec: every required
/// argument must be present, and no unrecognized argument names are allowed
/// (§4.2.4). Both failure kinds are reported together in one error.
pub fn validate_prompt_arguments(
    specs: &[PromptArgument],
    arguments: &HashMap<String, Value>,
) -> mcpkit_protocol::Result<()> {
    let known: std::collections::HashSet<&str> = specs.iter().map(|a| a.name.as_str()).collect();

    let missing: Vec<&str> = specs
        .iter()
        .filter(|a| a.required && !arguments.contains_key(&a.name))
        .map(|a| a.name.as_str())
        .collect();

    let unknown: Vec<&str> = arguments
        .keys()
        .filter(|k| !known.contains(k.as_str()))
        .map(String::as_str)
        .collect();

    if missing.is_empty() && unknown.is_empty() {
        Ok(())
    } else {
        Err(McpError::invalid_params(
            "invalid prompt arguments",
            serde_json::json!({"missing": missing, "unknown": unknown}),
        )
        .into_box())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_schema_reports_missing_required_and_wrong_type() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
            "required": ["a", "b"],
        });
        let args = serde_json::json!({"a": "x"});
        let err = validate_tool_arguments(&schema, &args).unwrap_err();
        let errors = err.details.unwrap()["errors"].as_array().unwrap().len();
        assert!(errors >= 2);
    }

    #[test]
    fn tool_schema_accepts_valid_arguments() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}},
            "required": ["a"],
        });
        assert!(validate_tool_arguments(&schema, &serde_json::json!({"a": 1})).is_ok());
    }

    #[test]
    fn prompt_arguments_report_missing_and_unknown() {
        let specs = vec![
            PromptArgument { name: "name".into(), description: None, required: true },
            PromptArgument { name: "tone".into(), description: None, required: false },
        ];
        let mut args = HashMap::new();
        args.insert("extra".to_string(), serde_json::json!("x"));
        let err = validate_prompt_arguments(&specs, &args).unwrap_err();
        let details = err.details.unwrap();

        use pretty_assertions::assert_eq;
        assert_eq!(details, serde_json::json!({"missing": ["name"], "unknown": ["extra"]}));
    }

    #[test]
    fn prompt_arguments_accept_exact_match() {
        let specs = vec![PromptArgument { name: "name".into(), description: None, required: true }];
        let mut args = HashMap::new();
        args.insert("name".to_string(), serde_json::json!("world"));
        assert!(validate_prompt_arguments(&specs, &args).is_ok());
    }
}
