//! OCR engine interface.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{input::ImageInput, prelude::*};

pub mod tesseract;
pub mod vision;

pub use self::{tesseract::TesseractEngine, vision::GoogleVisionEngine};

/// Text recognized from one image, with an aggregate confidence in 0–100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
}

/// Hints forwarded to an engine.
///
/// Each engine interprets these per its own conventions: `psm` and `config`
/// are Tesseract-specific and ignored by the Vision engine, which in turn is
/// the only consumer of language hints in their BCP-47 form.
#[derive(Debug, Clone, Default)]
pub struct RecognizeOpts {
    /// Languages to recognize. Empty means the engine's default.
    pub languages: Vec<String>,
    /// Tesseract page segmentation mode.
    pub psm: Option<u32>,
    /// Tesseract `key=value` config overrides.
    pub config: Vec<String>,
}

/// A black-box OCR capability: invoke it on an image, get back text and a
/// confidence score.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// The engine name, as accepted by [`engine_for_name`].
    fn name(&self) -> &'static str;

    /// A human-readable version string, computed on demand.
    async fn version(&self) -> Result<String>;

    /// Recognize the text in `image`.
    async fn recognize(
        &self,
        image: &ImageInput,
        opts: &RecognizeOpts,
    ) -> Result<Recognition>;
}

/// Get the OCR engine with the specified name.
pub fn engine_for_name(name: &str) -> Result<Arc<dyn OcrEngine>> {
    match name {
        "tesseract" => Ok(Arc::new(TesseractEngine::new())),
        "google-vision" => Ok(Arc::new(GoogleVisionEngine::new())),
        other => Err(OcrError::invalid_input(format!(
            "unknown OCR engine {other:?} (expected \"tesseract\" or \"google-vision\")"
        ))),
    }
}
