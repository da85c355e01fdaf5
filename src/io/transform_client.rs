//! HTTP client for the text-generation service (Gemini `generateContent`).

use std::time::Duration;

use serde_json::{Value, json};

use crate::model::config::TransformConfig;
use crate::ops::transform::{
    self, BREAKDOWN_FIELD, SUGGEST_FIELD, TransformError, TransformGateway,
};

pub struct HttpTransformGateway {
    agent: ureq::Agent,
    url: String,
}

impl HttpTransformGateway {
    /// Build a client from config. The API key is read from the environment
    /// variable the config names.
    pub fn from_config(config: &TransformConfig) -> Result<Self, TransformError> {
        let key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TransformError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(config, &key))
    }

    pub fn new(config: &TransformConfig, api_key: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        HttpTransformGateway {
            agent,
            url: generate_url(&config.endpoint, &config.model, api_key),
        }
    }

    fn generate(&self, prompt: &str, schema: Option<Value>) -> Result<String, TransformError> {
        let body = request_body(prompt, schema);
        tracing::debug!(prompt_len = prompt.len(), "sending generateContent request");

        let resp = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e: ureq::Error| match e {
                ureq::Error::Status(status, resp) => TransformError::Status {
                    status,
                    body: resp.into_string().unwrap_or_default(),
                },
                ureq::Error::Transport(t) => TransformError::Request(t.to_string()),
            })?;

        let value: Value = resp
            .into_json()
            .map_err(|e| TransformError::Malformed(format!("response body: {}", e)))?;
        response_text(&value)
    }
}

impl TransformGateway for HttpTransformGateway {
    fn breakdown(&self, task_text: &str) -> Result<Vec<String>, TransformError> {
        let raw = self.generate(
            &transform::breakdown_prompt(task_text),
            Some(transform::string_list_schema(BREAKDOWN_FIELD)),
        )?;
        transform::parse_string_list(&raw, BREAKDOWN_FIELD)
    }

    fn suggest(&self, monthly_text: &str) -> Result<Vec<String>, TransformError> {
        let raw = self.generate(
            &transform::suggest_prompt(monthly_text),
            Some(transform::string_list_schema(SUGGEST_FIELD)),
        )?;
        transform::parse_string_list(&raw, SUGGEST_FIELD)
    }

    fn review(&self, completed_text: &str) -> Result<String, TransformError> {
        let text = self.generate(&transform::review_prompt(completed_text), None)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(TransformError::Empty);
        }
        Ok(text.to_string())
    }
}

fn generate_url(endpoint: &str, model: &str, api_key: &str) -> String {
    format!(
        "{}/models/{}:generateContent?key={}",
        endpoint.trim_end_matches('/'),
        model,
        api_key
    )
}

/// Request payload; with a schema the service is asked for JSON output.
fn request_body(prompt: &str, schema: Option<Value>) -> Value {
    let mut body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    });
    if let Some(schema) = schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

/// Pull `candidates[0].content.parts[0].text` out of a response.
fn response_text(value: &Value) -> Result<String, TransformError> {
    value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TransformError::Malformed("no candidate text in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_includes_model_and_key() {
        assert_eq!(
            generate_url(
                "https://generativelanguage.googleapis.com/v1beta/",
                "gemini-2.0-flash",
                "k123"
            ),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=k123"
        );
    }

    #[test]
    fn body_with_schema_requests_json() {
        let body = request_body("split it", Some(transform::string_list_schema("subtasks")));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "split it");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["properties"]["subtasks"]["type"],
            "ARRAY"
        );
    }

    #[test]
    fn body_without_schema_is_free_text() {
        let body = request_body("review", None);
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn extracts_first_candidate_text() {
        let resp = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"subtasks\":[\"a\"]}" }] } }]
        });
        assert_eq!(response_text(&resp).unwrap(), "{\"subtasks\":[\"a\"]}");
        assert!(matches!(
            response_text(&json!({"candidates": []})),
            Err(TransformError::Malformed(_))
        ));
    }

    #[test]
    fn missing_key_is_reported() {
        let config = TransformConfig {
            api_key_env: "PRIORITY_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..TransformConfig::default()
        };
        assert!(matches!(
            HttpTransformGateway::from_config(&config),
            Err(TransformError::MissingApiKey(name)) if name == "PRIORITY_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
