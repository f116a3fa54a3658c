//! OCR engine wrapping the `tesseract` CLI tool.

use std::{env, ffi::OsString, sync::LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use crate::{
    input::ImageInput,
    prelude::*,
    tsv::{parse_tokens, reduce},
};

use super::{OcrEngine, Recognition, RecognizeOpts};

/// Matches the version token in `tesseract --version` output, which looks
/// like `tesseract 4.1.1` (or `tesseract v3.05.02` on old Windows builds).
static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tesseract\s+v?(\S+)").expect("failed to compile regex"));

/// The binary to run, overridable for nonstandard installs.
fn tesseract_command() -> String {
    env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string())
}

/// OCR engine wrapping the locally installed `tesseract` binary.
///
/// Each call stages the input if needed, runs
/// `tesseract <input> <output-base> [-l <lang>] [--psm <n>] [-c <k=v>]... tsv`,
/// and reduces the resulting TSV table to text plus an average confidence.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct TesseractEngine {}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn version(&self) -> Result<String> {
        let output = Command::new(tesseract_command())
            .arg("--version")
            .output()
            .await?;
        check_for_command_failure("tesseract", &output)?;
        // Old tesseract releases print the version to stderr.
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let captures = VERSION_REGEX.captures(&combined).ok_or_else(|| {
            OcrError::parse(format!(
                "no version token in tesseract --version output: {combined:?}"
            ))
        })?;
        Ok(format!("Tesseract {}", &captures[1]))
    }

    #[instrument(level = "debug", skip_all)]
    async fn recognize(
        &self,
        image: &ImageInput,
        opts: &RecognizeOpts,
    ) -> Result<Recognition> {
        image.validate()?;

        // Stage the input and run tesseract inside one temporary directory,
        // cleaned up on every exit path when the guard drops.
        let tmpdir = tempfile::TempDir::with_prefix("tessvision")?;
        let input_path = image.stage_for_command(tmpdir.path())?;
        let output_base = tmpdir.path().join("output");

        let args = build_args(&input_path, &output_base, opts);
        debug!(?args, "running tesseract");
        let output = Command::new(tesseract_command()).args(&args).output().await?;
        check_for_command_failure("tesseract", &output)?;

        let tsv = tokio::fs::read_to_string(output_base.with_extension("tsv")).await?;
        Ok(reduce(parse_tokens(&tsv)?))
    }
}

/// Build the tesseract command line. The trailing `tsv` config name selects
/// the tabular output that carries per-word confidences.
fn build_args(input: &Path, output_base: &Path, opts: &RecognizeOpts) -> Vec<OsString> {
    let mut args: Vec<OsString> =
        vec![input.as_os_str().to_owned(), output_base.as_os_str().to_owned()];
    if !opts.languages.is_empty() {
        // Tesseract's own multi-language convention, e.g. `eng+ita`.
        args.push("-l".into());
        args.push(opts.languages.join("+").into());
    }
    if let Some(psm) = opts.psm {
        args.push("--psm".into());
        args.push(psm.to_string().into());
    }
    for pair in &opts.config {
        args.push("-c".into());
        args.push(pair.clone().into());
    }
    args.push("tsv".into());
    args
}

/// Report a command failure, including any error output.
fn check_for_command_failure(
    command_name: &'static str,
    output: &std::process::Output,
) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!(command_name, output = %stdout, "Standard output from command");
    debug!(command_name, output = %stderr, "Standard error from command");

    if output.status.success() {
        Ok(())
    } else {
        Err(OcrError::engine_failure(
            command_name,
            output.status.code(),
            format!("exit status {}: {}", output.status, stderr.trim()),
        ))
    }
}
