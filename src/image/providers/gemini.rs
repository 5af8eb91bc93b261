//! Gemini (Google) image generation and editing provider.

use crate::error::{parse_retry_after, sanitize_error_message, BookartError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat,
};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Public Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Finish reasons that mean the safety layer swallowed the image.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

/// Gemini image model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image, the dedicated text-to-image model.
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image preview, which accepts image + text input for edits.
    ProImagePreview,
    /// Any other model id.
    Custom(String),
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImagePreview => "gemini-3-pro-image-preview",
            Self::Custom(id) => id,
        }
    }

    /// Whether the model accepts `imageConfig.imageSize`.
    ///
    /// Flash Image renders at a single fixed size and rejects the field.
    pub fn supports_image_size(&self) -> bool {
        !matches!(self, Self::FlashImage)
    }
}

impl FromStr for GeminiModel {
    type Err = BookartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Err(BookartError::Config("model id must not be empty".into())),
            "gemini-2.5-flash-image" => Ok(Self::FlashImage),
            "gemini-3-pro-image-preview" => Ok(Self::ProImagePreview),
            other => Ok(Self::Custom(other.to_string())),
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    api_base: Option<String>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the REST base URL (tests point this at a mock server).
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BookartError::Config("no Gemini API key provided".into()))?;

        Ok(GeminiProvider {
            client: reqwest::Client::builder().build()?,
            api_key,
            model: self.model,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    api_base: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_generation_request(request, &self.model);

        tracing::debug!(
            model = self.model.as_str(),
            edit = request.is_edit(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let mut image = gemini_response.into_image()?;
        image.metadata.model = Some(self.model.as_str().to_string());
        image.metadata.duration_ms = Some(start.elapsed().as_millis() as u64);
        Ok(image)
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> BookartError {
    let text = sanitize_error_message(text);
    match status {
        401 | 403 => BookartError::Auth(text),
        404 => BookartError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        ),
        429 => BookartError::RateLimited {
            retry_after: parse_retry_after(headers).map(Duration::from_secs),
        },
        _ => BookartError::Api {
            status,
            message: text,
        },
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.generate_impl(request).await
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<GeminiImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest, model: &GeminiModel) -> Self {
        let mut parts = Vec::new();

        // Input image goes first so the instruction reads as applying to it
        if let Some(ref image_data) = req.input_image {
            let mime_type = ImageFormat::from_magic_bytes(image_data)
                .map(|f| f.mime_type())
                .unwrap_or("image/png")
                .to_string();

            parts.push(GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(image_data),
                },
            });
        }

        parts.push(GeminiRequestPart::Text {
            text: req.prompt.clone(),
        });

        let image_size = req
            .resolution
            .filter(|_| model.supports_image_size())
            .map(|r| r.as_str().to_string());
        let aspect_ratio = req.aspect_ratio.map(|r| r.as_str().to_string());
        let image_config = if aspect_ratio.is_some() || image_size.is_some() {
            Some(GeminiImageConfig {
                aspect_ratio,
                image_size,
            })
        } else {
            None
        };

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: req
                    .modalities
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
                image_config,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    /// Picks the first inline image of the first candidate.
    ///
    /// Later image parts are ignored, as are image parts with an empty payload.
    /// Text parts only feed diagnostics.
    fn into_image(self) -> Result<GeneratedImage> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| {
            f.block_reason.map(|reason| {
                f.block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {reason}"))
            })
        }) {
            return Err(BookartError::ContentBlocked(reason));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(BookartError::NoImage {
                finish_reason: None,
                text: Vec::new(),
            });
        };

        let mut inline = None;
        let mut text = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text.filter(|t| !t.is_empty()) {
                text.push(t);
            }
            if inline.is_none() {
                inline = part.inline_data.filter(|d| !d.data.trim().is_empty());
            }
        }

        let Some(inline) = inline else {
            if let Some(reason) = candidate
                .finish_reason
                .as_deref()
                .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
            {
                return Err(BookartError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {reason}"
                )));
            }
            return Err(BookartError::NoImage {
                finish_reason: candidate.finish_reason,
                text,
            });
        };

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| BookartError::Decode(e.to_string()))?;

        let format = ImageFormat::from_mime_type(&inline.mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .unwrap_or_default();

        let mut image = GeneratedImage::new(
            data,
            format,
            GenerationMetadata {
                finish_reason: candidate.finish_reason,
                ..Default::default()
            },
        );
        image.text = text;
        Ok(image)
    }
}
