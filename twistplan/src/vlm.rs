//! Vision-language model client used by the planning driver.
//!
//! The engine itself never touches the network; this module is the
//! collaborator that produces raw plans in the first place. The provider
//! speaks the OpenAI-compatible chat-completions protocol with a JSON
//! response format and data-URL image parts, so it works against OpenAI
//! or any compatible gateway. A deterministic stub provider exists for
//! tests and offline demos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ModelConfig;

#[derive(Debug, Error)]
pub enum VlmError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Model API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse model response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for VlmError {
    fn from(e: reqwest::Error) -> Self {
        VlmError::Http(e.to_string())
    }
}

/// One base64-encoded camera frame attached to a planning request.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub media_type: String,
    pub base64_data: String,
}

impl ImageAttachment {
    pub fn jpeg(base64_data: impl Into<String>) -> Self {
        Self {
            media_type: "image/jpeg".to_string(),
            base64_data: base64_data.into(),
        }
    }

    fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64_data)
    }
}

/// Everything the model sees for one planning request, besides the
/// system prompt.
#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    pub task: String,
    pub description: String,
    /// Rendered per-object point metadata, already formatted for the
    /// prompt.
    pub object_metadata: String,
    pub images: Vec<ImageAttachment>,
}

impl PlanContext {
    fn user_text(&self) -> String {
        format!(
            "Task: {}\nDescription: {}\n\nObject Data (Metadata):\n{}",
            self.task, self.description, self.object_metadata
        )
    }
}

/// A model capable of producing a raw plan record from a task context.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Generate a raw (unvalidated) plan as parsed JSON.
    async fn generate_plan(
        &self,
        system_prompt: &str,
        context: &PlanContext,
    ) -> Result<Value, VlmError>;

    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// OpenAI-compatible provider
// ---------------------------------------------------------------------------

pub struct OpenAiVisionModel {
    config: ModelConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiVisionModel {
    pub fn new(config: ModelConfig, api_key: Option<String>) -> Result<Self, VlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| VlmError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn request_body(&self, system_prompt: &str, context: &PlanContext) -> ChatRequest {
        let mut parts = vec![ContentPart::Text {
            text: context.user_text(),
        }];
        for image in &context.images {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            });
        }
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: RequestContent::Text(system_prompt.to_string()),
                },
                ChatRequestMessage {
                    role: "user",
                    content: RequestContent::Parts(parts),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionModel {
    async fn generate_plan(
        &self,
        system_prompt: &str,
        context: &PlanContext,
    ) -> Result<Value, VlmError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| VlmError::MissingApiKey(self.config.api_key_env.clone()))?;
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");
        let url = format!("{base_url}/chat/completions");

        log::debug!(
            "[vlm] requesting plan for task '{}' from {} ({} images)",
            context.task,
            self.config.model,
            context.images.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&self.request_body(system_prompt, context))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(VlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| VlmError::Parse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| VlmError::Parse("response carried no message content".to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| VlmError::Parse(format!("model output is not a JSON plan: {e}")))
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: RequestContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Stub provider
// ---------------------------------------------------------------------------

/// Deterministic provider for tests and offline runs. Returns a canned
/// plan, or a minimal grasp-and-place sequence derived from the context.
pub struct StubVisionModel {
    canned: Option<Value>,
}

impl StubVisionModel {
    pub fn with_plan(plan: Value) -> Self {
        Self { canned: Some(plan) }
    }
}

impl Default for StubVisionModel {
    fn default() -> Self {
        Self { canned: None }
    }
}

#[async_trait]
impl VisionModel for StubVisionModel {
    async fn generate_plan(
        &self,
        _system_prompt: &str,
        context: &PlanContext,
    ) -> Result<Value, VlmError> {
        if let Some(plan) = &self.canned {
            return Ok(plan.clone());
        }
        Ok(json!({
            "task": context.task,
            "sequence": [
                {
                    "subtask": "grasp",
                    "frame": "CONTACT",
                    "actor_obj": null,
                    "target_obj": null,
                    "actor_point": 0,
                    "target_point": null,
                    "V": [0.0, 0.0, 0.5, 0.0, 0.0, 0.0],
                    "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    "notes": "stub grasp"
                },
                {
                    "subtask": "place",
                    "frame": "WORLD",
                    "actor_obj": null,
                    "target_obj": null,
                    "actor_point": null,
                    "target_point": null,
                    "V": [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
                    "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    "notes": "stub place"
                }
            ]
        }))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
