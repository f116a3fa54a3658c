//! Thin wrappers around the `tesseract` CLI and the Google Vision API.
//!
//! Given an image — a file path, a raw bitmap, or an already-decoded
//! [`image::DynamicImage`] — and optional language/segmentation hints, each
//! engine returns the recognized text and an aggregate confidence score in
//! the 0–100 range. Recognition itself is entirely delegated to the wrapped
//! engine; this crate handles input normalization, invocation, and output
//! parsing.
//!
//! ```no_run
//! use tessvision::{ImageInput, RecognizeOpts, engine_for_name};
//!
//! # #[tokio::main]
//! # async fn main() -> tessvision::Result<()> {
//! let engine = engine_for_name("tesseract")?;
//! let recognition = engine
//!     .recognize(&ImageInput::Path("scan.png".into()), &RecognizeOpts::default())
//!     .await?;
//! println!("{} ({:.2}%)", recognition.text, recognition.confidence);
//! # Ok(())
//! # }
//! ```

pub mod engines;
pub mod error;
pub mod input;
mod prelude;
pub mod tsv;

pub use self::{
    engines::{
        GoogleVisionEngine, OcrEngine, Recognition, RecognizeOpts, TesseractEngine,
        engine_for_name,
    },
    error::{OcrError, Result},
    input::{ImageInput, PixelFormat, SUPPORTED_EXTENSIONS},
    tsv::{TokenRecord, parse_tokens, reduce},
};
