// Connectivity checks against the model server using the resolved profile.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::llm::{CompletionOptions, LlmClient};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn from_result(name: &'static str, result: Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name,
                passed: true,
                detail,
            },
            Err(e) => Self {
                name,
                passed: false,
                detail: e.to_string(),
            },
        }
    }
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

async fn probe_models(base_url: &str) -> Result<String> {
    let http = HttpClient::new(base_url, PROBE_TIMEOUT)?;
    let list: ModelList = http.get_json("models").await?;
    Ok(format!("{} model(s) available", list.data.len()))
}

async fn plain_completion(llm: &LlmClient) -> Result<String> {
    llm.complete(
        None,
        "Say hello in one sentence.",
        CompletionOptions {
            max_tokens: Some(50),
            temperature: Some(0.7),
        },
    )
    .await
}

async fn crew_style_completion(llm: &LlmClient) -> Result<String> {
    llm.complete(
        Some("You are an AI assistant. Answer concisely."),
        "Write a brief summary about AI LLMs in 2-3 sentences.",
        CompletionOptions {
            max_tokens: Some(200),
            temperature: Some(0.7),
        },
    )
    .await
}

/// Probe `/models`, then run two completions. Completions are skipped when
/// the server is unreachable.
pub async fn run_checks(model: &ModelConfig) -> Result<Vec<CheckResult>> {
    let mut results = Vec::with_capacity(3);

    let probe = CheckResult::from_result("server", probe_models(&model.base_url).await);
    let reachable = probe.passed;
    results.push(probe);
    if !reachable {
        return Ok(results);
    }

    let llm = LlmClient::from_model_config(model)?;
    debug!(model = llm.model(), "running completion checks");
    results.push(CheckResult::from_result(
        "completion",
        plain_completion(&llm).await,
    ));
    results.push(CheckResult::from_result(
        "crew-style completion",
        crew_style_completion(&llm).await,
    ));

    Ok(results)
}

pub fn render_results(results: &[CheckResult]) -> String {
    let mut out = String::new();
    for r in results {
        let mark = if r.passed { "+" } else { "-" };
        out.push_str(&format!("{mark} {}: {}\n", r.name, r.detail.trim()));
    }
    out.push('\n');
    if results.iter().all(|r| r.passed) && results.len() == 3 {
        out.push_str("+ All checks passed - LM Studio is ready for the crew\n");
    } else {
        out.push_str("- Some checks failed\n");
    }
    out
}
