// Chat-completion client that answers a question from retrieved context


use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use url::Url;

use crate::QaError;
use crate::config::Config;
use crate::http::{build_agent, post_json, run_cancellable, service_error_message};

pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
pub const ANSWER_TEMPERATURE: f32 = 0.3;
pub const ANSWER_MAX_TOKENS: u32 = 400;

const SYSTEM_INSTRUCTIONS: &str = "Answer the question based only on the following context. \
Be concise and accurate. If you don't know, say \"I don't know.\"";

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct AnswerClient {
    endpoint: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The system message: fixed instructions followed by the retrieved context
#[inline]
pub fn system_prompt(context: &str) -> String {
    format!("{SYSTEM_INSTRUCTIONS}\n\nContext:\n{context}")
}

impl AnswerClient {
    #[inline]
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = config
            .service_url()
            .context("Failed to build service URL from config")?
            .join("chat/completions")
            .context("Failed to build chat completions URL")?;

        Ok(Self {
            endpoint,
            model: config.service.completion_model.clone(),
            api_key: api_key.into(),
            agent: build_agent(config.service.timeout()),
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model `question`, grounding it in `context`.
    ///
    /// Returns the content of the first choice. A non-success response fails
    /// with the service's error message, as does a response without choices.
    #[inline]
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let system = system_prompt(context);
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            temperature: ANSWER_TEMPERATURE,
            max_tokens: ANSWER_MAX_TOKENS,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize completion request")?;

        debug!(
            "Requesting completion from {} (context: {} chars)",
            self.model,
            context.chars().count()
        );

        let agent = self.agent.clone();
        let url = self.endpoint.to_string();
        let api_key = self.api_key.clone();

        let response = run_cancellable(cancel, move || {
            post_json(&agent, &url, &api_key, &request_json).map_err(|e| {
                anyhow::Error::from(QaError::Network(format!("Completion request failed: {e}")))
            })
        })
        .await?;

        if !response.is_success() {
            let message = service_error_message(&response);
            error!("Completion failed with {}: {}", response.status, message);
            return Err(QaError::CompletionService(message).into());
        }

        let parsed: CompletionResponse = serde_json::from_slice(&response.body)
            .context("Failed to parse completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| {
                anyhow::Error::from(QaError::CompletionService(
                    "response contained no choices".to_string(),
                ))
            })
    }
}
