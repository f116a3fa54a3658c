//! Error taxonomy for OCR invocation and output parsing.

use std::path::PathBuf;

use thiserror::Error;

/// A `Result` alias defaulting to [`OcrError`].
pub type Result<T, E = OcrError> = std::result::Result<T, E>;

/// Everything that can go wrong between receiving an image and returning
/// recognized text.
///
/// All variants are surfaced to the caller unmodified. There is no local
/// recovery and no retrying anywhere in the crate; each OCR call is a
/// single-shot invocation.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The image argument is structurally unusable, such as a bitmap whose
    /// buffer does not match its declared dimensions. Raised before any
    /// temporary file is created.
    #[error("invalid image input: {message}")]
    InvalidInput { message: String },

    /// The path extension is not in the supported set. Raised before any
    /// engine invocation.
    #[error(
        "{} is not a supported image format (expected gif, png, jpg, jpeg, tif or tiff)",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    /// The external process or API call failed. `status` carries the exit
    /// code or HTTP status when one is available; `details` carries the
    /// captured output for diagnostics.
    #[error("{engine} invocation failed: {details}")]
    EngineFailure {
        engine: &'static str,
        status: Option<i32>,
        details: String,
    },

    /// The engine produced output we could not parse into the expected
    /// tabular or JSON shape.
    #[error("could not parse engine output: {message}")]
    Parse { message: String },

    /// An I/O failure while staging input or reading engine output.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// A failure encoding a non-path input to PNG.
    #[error("image encoding failed")]
    Image(#[from] image::ImageError),
}

impl OcrError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn engine_failure(
        engine: &'static str,
        status: Option<i32>,
        details: impl Into<String>,
    ) -> Self {
        Self::EngineFailure {
            engine,
            status,
            details: details.into(),
        }
    }
}
