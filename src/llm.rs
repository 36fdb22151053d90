use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Chat-completion client for an OpenAI-compatible server.
pub struct LlmClient {
    model: String,
    api_key: String,
    http: HttpClient,
}

/// Sampling knobs sent with a completion; `None` leaves the server default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    pub fn new(model: String, api_key: String, http: HttpClient) -> Self {
        Self {
            model,
            api_key,
            http,
        }
    }

    /// Build from a resolved profile, using its timeout for every request.
    pub fn from_model_config(config: &ModelConfig) -> Result<Self> {
        let http = HttpClient::new(&config.base_url, config.timeout())?;
        Ok(Self::new(
            config.api_model().to_string(),
            config.api_key.clone(),
            http,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(
        &self,
        system: Option<&str>,
        user_message: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        debug!(model = %self.model, "sending chat completion");

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Msg {
                role: "system",
                content: system,
            });
        }
        messages.push(Msg {
            role: "user",
            content: user_message,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let resp: ChatResponse = self
            .http
            .post_json("chat/completions", &request, Some(&self.api_key))
            .await
            .map_err(|e| {
                warn!("LLM API error: {e}");
                e
            })?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::parse("empty response from LLM"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_options() {
        let request = ChatRequest {
            model: "m",
            messages: vec![Msg {
                role: "user",
                content: "hi",
            }],
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("hello"));
    }
}
