//! Tesseract's TSV output, and reducing it to text plus a confidence score.

use crate::{engines::Recognition, prelude::*};

/// One row of an OCR engine's structured per-word output.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub text: String,
    /// 0–100 for a recognized word; −1 marks a line/paragraph boundary.
    pub confidence: f32,
}

impl TokenRecord {
    /// Is this record a line/paragraph boundary rather than a recognized
    /// word?
    ///
    /// Zero-confidence words count as words: the boundary sentinel is −1,
    /// and Tesseract does emit genuine 0% recognitions.
    pub fn is_boundary(&self) -> bool {
        self.confidence < 0.0
    }
}

/// Reduce a token stream to `(text, average confidence)`.
///
/// Each boundary marker flushes the accumulated line, even if it is empty,
/// and a final flush happens unconditionally so a trailing line without a
/// boundary marker is not lost. Word confidences are averaged arithmetically;
/// a stream with no words reduces to `("", 0)`.
pub fn reduce(tokens: impl IntoIterator<Item = TokenRecord>) -> Recognition {
    let mut lines: Vec<String> = vec![];
    let mut current_line: Vec<String> = vec![];
    let mut confidence_sum = 0.0f32;
    let mut counted = 0usize;

    for token in tokens {
        if token.is_boundary() {
            lines.push(current_line.join(" "));
            current_line.clear();
        } else {
            current_line.push(token.text);
            confidence_sum += token.confidence;
            counted += 1;
        }
    }
    lines.push(current_line.join(" "));

    let text = lines.join("\n").trim().to_string();
    let confidence = if counted > 0 {
        confidence_sum / counted as f32
    } else {
        0.0
    };
    Recognition { text, confidence }
}

/// Parse Tesseract's TSV output into token records.
///
/// The real files carry 12 columns; we only consume `conf` and `text`.
/// Quoting is disabled because Tesseract never quotes its output, and
/// recognized text regularly contains `"` characters that must not start a
/// quoted field.
pub fn parse_tokens(tsv: &str) -> Result<Vec<TokenRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(tsv.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| OcrError::parse(format!("malformed TSV header: {e}")))?
        .clone();
    let conf_idx = headers
        .iter()
        .position(|h| h == "conf")
        .ok_or_else(|| OcrError::parse("TSV output has no `conf` column"))?;
    let text_idx = headers
        .iter()
        .position(|h| h == "text")
        .ok_or_else(|| OcrError::parse("TSV output has no `text` column"))?;

    let mut tokens = vec![];
    for record in reader.records() {
        let record = record.map_err(|e| OcrError::parse(format!("malformed TSV row: {e}")))?;
        let conf_cell = record
            .get(conf_idx)
            .ok_or_else(|| OcrError::parse("TSV row is missing its `conf` cell"))?;
        let confidence = conf_cell.trim().parse::<f32>().map_err(|_| {
            OcrError::parse(format!("non-numeric confidence value {conf_cell:?}"))
        })?;
        // Tesseract emits short rows for some boundary markers; treat a
        // missing `text` cell as an empty string.
        let text = record.get(text_idx).unwrap_or("").to_string();
        tokens.push(TokenRecord { text, confidence });
    }
    trace!("parsed {} token records", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: f32) -> TokenRecord {
        TokenRecord {
            text: text.to_string(),
            confidence,
        }
    }

    fn boundary() -> TokenRecord {
        word("", -1.0)
    }

    #[test]
    fn no_tokens_reduce_to_empty() {
        let result = reduce(vec![]);
        assert_eq!(result.text, "");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn single_line_has_no_embedded_newline_and_mean_confidence() {
        let result = reduce(vec![word("the", 90.0), word("quick", 80.0), word("fox", 70.0)]);
        assert_eq!(result.text, "the quick fox");
        assert!(!result.text.contains('\n'));
        assert_eq!(result.confidence, 80.0);
    }

    #[test]
    fn boundary_then_end_flushes_both_lines() {
        let result = reduce(vec![word("hi", 90.0), boundary(), word("bye", 80.0)]);
        assert_eq!(result.text, "hi\nbye");
        assert_eq!(result.confidence, 85.0);
    }

    #[test]
    fn all_boundaries_reduce_to_empty() {
        let result = reduce(vec![boundary(), boundary(), boundary()]);
        assert_eq!(result.text, "");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn zero_confidence_token_is_counted_as_a_word() {
        let result = reduce(vec![word("faint", 0.0), word("clear", 100.0)]);
        assert_eq!(result.text, "faint clear");
        assert_eq!(result.confidence, 50.0);
    }

    #[test]
    fn twelve_lines_yield_eleven_newlines() {
        let mut tokens = vec![];
        for i in 0..12 {
            if i > 0 {
                tokens.push(boundary());
            }
            tokens.push(word(&format!("line{i}"), 75.0));
        }
        let result = reduce(tokens);
        assert_eq!(result.text.matches('\n').count(), 11);
        assert_eq!(result.confidence, 75.0);
    }

    #[test]
    fn reduction_is_idempotent() {
        let tokens = vec![word("a", 10.0), boundary(), word("b", 20.0), boundary()];
        let first = reduce(tokens.clone());
        let second = reduce(tokens);
        assert_eq!(first, second);
    }

    #[test]
    fn interior_empty_lines_survive_the_trim() {
        let result = reduce(vec![
            word("top", 90.0),
            boundary(),
            boundary(),
            word("bottom", 90.0),
        ]);
        assert_eq!(result.text, "top\n\nbottom");
    }

    const TSV_HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn parses_real_shaped_tsv_output() {
        let tsv = format!(
            "{TSV_HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
             5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.5\thello\n\
             5\t1\t1\t1\t1\t2\t70\t10\t50\t20\t93.5\tworld\n"
        );
        let tokens = parse_tokens(&tsv).unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].is_boundary());
        let result = reduce(tokens);
        assert_eq!(result.text, "hello world");
        assert_eq!(result.confidence, 95.0);
    }

    #[test]
    fn quote_characters_in_text_do_not_start_a_quoted_field() {
        let tsv = format!(
            "{TSV_HEADER}\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t90\t\"quoted\n\
             5\t1\t1\t1\t1\t2\t0\t0\t10\t10\t90\tword\"\n"
        );
        let tokens = parse_tokens(&tsv).unwrap();
        assert_eq!(tokens[0].text, "\"quoted");
        assert_eq!(tokens[1].text, "word\"");
    }

    #[test]
    fn short_boundary_rows_carry_empty_text() {
        let tsv = format!(
            "{TSV_HEADER}\n\
             2\t1\t1\t0\t0\t0\t8\t9\t600\t400\t-1\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t88\tword\n"
        );
        let tokens = parse_tokens(&tsv).unwrap();
        assert_eq!(tokens[0].text, "");
        assert!(tokens[0].is_boundary());
        assert_eq!(tokens[1].text, "word");
    }

    #[test]
    fn non_numeric_confidence_is_a_parse_error() {
        let tsv = format!("{TSV_HEADER}\n5\t1\t1\t1\t1\t1\t0\t0\t10\t10\tNaN?\tword\n");
        assert!(matches!(
            parse_tokens(&tsv),
            Err(OcrError::Parse { .. })
        ));
    }

    #[test]
    fn missing_required_column_is_a_parse_error() {
        let tsv = "level\tpage_num\ttext\n5\t1\tword\n";
        assert!(matches!(parse_tokens(tsv), Err(OcrError::Parse { .. })));
    }

    #[test]
    fn fractional_confidences_average_correctly() {
        let tsv = format!(
            "{TSV_HEADER}\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t91.25\ta\n\
             5\t1\t1\t1\t1\t2\t0\t0\t10\t10\t92.75\tb\n"
        );
        let result = reduce(parse_tokens(&tsv).unwrap());
        assert_eq!(result.confidence, 92.0);
    }
}
