//! OCR engine wrapping the Google Vision `images:annotate` REST API.

use std::env;

use async_trait::async_trait;
use base64::{Engine as _, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use crate::{input::ImageInput, prelude::*};

use super::{OcrEngine, Recognition, RecognizeOpts};

/// Default API server. Override with `GOOGLE_VISION_API_BASE` (useful for
/// mock servers in tests).
const DEFAULT_API_BASE: &str = "https://vision.googleapis.com";

/// Language hints sent when the caller supplies none.
const DEFAULT_LANGUAGE_HINTS: &[&str] = &["en", "it"];

const ENGINE_NAME: &str = "google-vision";

/// OCR engine calling Google Vision's full-document text detection.
///
/// Authentication is an API key passed through from `GOOGLE_VISION_API_KEY`;
/// OAuth flows are the wrapped platform's business.
pub struct GoogleVisionEngine {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl GoogleVisionEngine {
    /// Create an engine configured from the environment.
    pub fn new() -> Self {
        Self::with_config(
            env::var("GOOGLE_VISION_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            env::var("GOOGLE_VISION_API_KEY").ok(),
        )
    }

    /// Create an engine talking to a specific server with a specific key.
    pub fn with_config(api_base: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }
}

impl Default for GoogleVisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrEngine for GoogleVisionEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    async fn version(&self) -> Result<String> {
        // The REST API is versioned by path, not by a queryable endpoint.
        Ok("Google Vision v1".to_string())
    }

    #[instrument(level = "debug", skip_all)]
    async fn recognize(
        &self,
        image: &ImageInput,
        opts: &RecognizeOpts,
    ) -> Result<Recognition> {
        image.validate()?;
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            OcrError::engine_failure(ENGINE_NAME, None, "GOOGLE_VISION_API_KEY is not set")
        })?;
        let bytes = image.to_engine_bytes()?;

        let language_hints = if opts.languages.is_empty() {
            DEFAULT_LANGUAGE_HINTS.iter().map(|s| s.to_string()).collect()
        } else {
            opts.languages.clone()
        };
        // `psm` and `config` are Tesseract-specific hints with no Vision
        // equivalent; they are ignored here.
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: BASE64_STANDARD.encode(&bytes),
                },
                features: vec![Feature {
                    kind: "DOCUMENT_TEXT_DETECTION",
                }],
                image_context: ImageContext { language_hints },
            }],
        };

        let url = format!("{}/v1/images:annotate", self.api_base.trim_end_matches('/'));
        debug!(url = %url, "calling Google Vision");
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                OcrError::engine_failure(ENGINE_NAME, None, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(OcrError::engine_failure(
                ENGINE_NAME,
                Some(i32::from(status.as_u16())),
                format!("HTTP {status}: {}", details.trim()),
            ));
        }
        let parsed = response.json::<AnnotateResponse>().await.map_err(|e| {
            OcrError::parse(format!("malformed images:annotate response: {e}"))
        })?;

        let first = parsed.responses.into_iter().next().ok_or_else(|| {
            OcrError::parse("images:annotate response contained no entries")
        })?;
        if let Some(error) = first.error {
            return Err(OcrError::engine_failure(
                ENGINE_NAME,
                Some(error.code),
                error.message,
            ));
        }
        let Some(annotation) = first.full_text_annotation else {
            // Nothing detected at all.
            return Ok(Recognition {
                text: String::new(),
                confidence: 0.0,
            });
        };

        // The API reports block confidences in [0, 1]; scale to [0, 100] and
        // take the first block of the first page as representative.
        let confidence = annotation
            .pages
            .first()
            .and_then(|page| page.blocks.first())
            .map(|block| block.confidence * 100.0)
            .unwrap_or(0.0);
        Ok(Recognition {
            text: annotation.text.trim().to_string(),
            confidence,
        })
    }
}

/// Request body for `images:annotate`.
#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
    image_context: ImageContext,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    /// Base64-encoded image bytes.
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

/// Response body for `images:annotate`.
#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<VisionPage>,
}

#[derive(Debug, Deserialize)]
struct VisionPage {
    #[serde(default)]
    blocks: Vec<VisionBlock>,
}

#[derive(Debug, Deserialize)]
struct VisionBlock {
    #[serde(default)]
    confidence: f32,
}

/// A `google.rpc.Status` error payload.
#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}
