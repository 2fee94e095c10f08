//! Vision-model client.
//!
//! The external critique service is an opaque collaborator: it receives a
//! prompt plus an image and returns a JSON document. [`VisionModel`] is
//! the seam; [`OpenAiVision`] is the production implementation speaking
//! the chat-completions protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::master::MasterVerdict;
use crate::prompt;
use crate::report::CritiqueReport;

/// Default chat-completions endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default vision-capable model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Low temperature for structured output.
const CRITIQUE_TEMPERATURE: f32 = 0.2;
const CRITIQUE_MAX_TOKENS: u32 = 1500;
const VALIDATION_MAX_TOKENS: u32 = 500;

/// Failures talking to or interpreting the model.
#[derive(Debug, thiserror::Error)]
pub enum CritiqueError {
    /// Transport-level failure reaching the service.
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("model returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },
    /// The payload did not match the expected schema.
    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// The external model boundary.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Critique one artwork image under the given system prompt.
    async fn critique(
        &self,
        system_prompt: &str,
        image_url: &str,
    ) -> Result<CritiqueReport, CritiqueError>;

    /// Judge whether `name` is a recognized master artist.
    async fn validate_master(
        &self,
        name: &str,
        medium: Option<&str>,
    ) -> Result<MasterVerdict, CritiqueError>;
}

/// Chat-completions client.
pub struct OpenAiVision {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiVision {
    /// Client against the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        }
    }

    /// Override the endpoint (proxies, compatible providers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, CritiqueError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %detail, "model call failed");
            return Err(CritiqueError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CritiqueError::Malformed("response carried no choices".into()))
    }
}

#[async_trait]
impl VisionModel for OpenAiVision {
    async fn critique(
        &self,
        system_prompt: &str,
        image_url: &str,
    ) -> Result<CritiqueReport, CritiqueError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: Some(CRITIQUE_TEMPERATURE),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user_with_image("Please analyze my artwork.", image_url),
            ],
            response_format: ResponseFormat::json_object(),
            max_tokens: CRITIQUE_MAX_TOKENS,
        };
        let raw = self.complete(&request).await?;
        CritiqueReport::parse(&raw)
    }

    async fn validate_master(
        &self,
        name: &str,
        medium: Option<&str>,
    ) -> Result<MasterVerdict, CritiqueError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: None,
            messages: vec![
                ChatMessage::system(prompt::master_validation_prompt()),
                ChatMessage::user(prompt::master_validation_request(name, medium)),
            ],
            response_format: ResponseFormat::json_object(),
            max_tokens: VALIDATION_MAX_TOKENS,
        };
        let raw = self.complete(&request).await?;
        MasterVerdict::parse(&raw)
    }
}

// ---- wire types ----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}
