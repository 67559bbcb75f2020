// 🌐 Gemini Image Generator - remote collaborator over HTTP
//
// POST {endpoint}/models/{model}:generateContent
//   contents.parts = [inlineData(image)..., text(prompt)]
//   generationConfig.responseModalities = ["IMAGE"]
//
// The first inline-data part of the first candidate is the result.

use crate::config::GeneratorConfig;
use crate::editing::{ImageData, ImageGenerator};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// MIME type assumed when the service omits one
const RESULT_MIME: &str = "image/png";

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl Part {
    fn image(image: &ImageData) -> Self {
        Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(image.mime_type.clone()),
                data: image.to_base64(),
            }),
        }
    }

    fn text(prompt: &str) -> Self {
        Part {
            text: Some(prompt.to_string()),
            inline_data: None,
        }
    }
}

// ============================================================================
// GENERATOR
// ============================================================================

pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GeminiGenerator {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn generate(&self, images: &[&ImageData], prompt: &str) -> Result<ImageData, GenerationError> {
        // Checked per call: a missing key is a failure of this request only
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let mut parts: Vec<Part> = images.iter().map(|image| Part::image(image)).collect();
        parts.push(Part::text(prompt));
        let request = GenerateRequest {
            contents: Content { parts },
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
            },
        };

        debug!(model = %self.model, images = images.len(), "calling image service");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        extract_image(&body)
    }
}

#[async_trait]
impl ImageGenerator for GeminiGenerator {
    async fn edit(&self, image: &ImageData, prompt: &str) -> Result<ImageData, GenerationError> {
        self.generate(&[image], prompt).await
    }

    async fn merge(
        &self,
        first: &ImageData,
        second: &ImageData,
        prompt: &str,
    ) -> Result<ImageData, GenerationError> {
        self.generate(&[first, second], prompt).await
    }
}

// ============================================================================
// RESPONSE PARSING
// ============================================================================

/// Pull the first inline image out of a generateContent response body
fn extract_image(body: &str) -> Result<ImageData, GenerationError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;

    let inline = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| {
            candidate
                .content
                .parts
                .into_iter()
                .find_map(|part| part.inline_data)
        })
        .ok_or(GenerationError::NoImage)?;

    let mime_type = inline.mime_type.unwrap_or_else(|| RESULT_MIME.to_string());
    ImageData::from_base64(&inline.data, mime_type)
}

/// Service error message if the body carries one, else the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ============================================================================
// TESTS
// ============================================================================
