//! Command-line entry point: recognize one image with one engine.

use std::{path::PathBuf, str::FromStr, time::Instant};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{debug, instrument};
use tracing_subscriber::{EnvFilter, filter::Directive};

use tessvision::{ImageInput, RecognizeOpts, engine_for_name};

/// Recognize the text in an image with Tesseract or Google Vision.
#[derive(Debug, Parser)]
#[clap(
    version,
    after_help = r#"
Environment Variables:
  - TESSERACT_CMD (optional): Override the `tesseract` binary name.
  - GOOGLE_VISION_API_KEY: API key for the google-vision engine.
  - GOOGLE_VISION_API_BASE (optional): Override the Vision server URL.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    /// Path to the image where to perform OCR.
    image: PathBuf,

    /// OCR engine to use.
    #[clap(value_enum)]
    engine: EngineName,

    /// Language hint; may be repeated. Tesseract takes its own codes
    /// (`eng`, `ita`, ...), google-vision takes BCP-47 (`en`, `it`, ...).
    #[clap(long = "lang", value_name = "LANG")]
    languages: Vec<String>,

    /// Tesseract page segmentation mode.
    #[clap(long)]
    psm: Option<u32>,

    /// Tesseract `key=value` config override; may be repeated.
    #[clap(long = "config", value_name = "KEY=VALUE")]
    config: Vec<String>,

    /// Print one JSON object instead of the banner report.
    #[clap(long)]
    json: bool,
}

/// The engines we can dispatch to.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineName {
    Tesseract,
    GoogleVision,
}

impl EngineName {
    fn as_str(self) -> &'static str {
        match self {
            EngineName::Tesseract => "tesseract",
            EngineName::GoogleVision => "google-vision",
        }
    }
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Call our real `main` function now that logging is set up.
    real_main().await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main() -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    let engine = engine_for_name(opts.engine.as_str())?;
    let image = ImageInput::Path(opts.image.clone());
    let recognize_opts = RecognizeOpts {
        languages: opts.languages.clone(),
        psm: opts.psm,
        config: opts.config.clone(),
    };

    let start = Instant::now();
    let recognition = engine.recognize(&image, &recognize_opts).await?;
    let elapsed = start.elapsed();
    let version = engine.version().await?;

    if opts.json {
        let report = serde_json::json!({
            "text": recognition.text,
            "confidence": recognition.confidence,
            "engine": engine.name(),
            "engine_version": version,
            "elapsed_seconds": elapsed.as_secs_f64(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:=^50}", "OCR result");
        println!("{}", recognition.text);
        println!("{:=^50}", "");
        println!("{:=^50}", "Info");
        println!("Confidence: {:.2}%", recognition.confidence);
        println!("OCR engine: {version}");
        println!("Elapsed time: {:.3} seconds", elapsed.as_secs_f64());
        println!("{:=^50}", "");
    }
    Ok(())
}
