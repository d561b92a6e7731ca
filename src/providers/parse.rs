//! Parsing of model extraction output
//!
//! Models are asked for bare JSON but in practice wrap it in code fences or
//! emit several concatenated objects. This module recovers the usable cases
//! and classifies the rest as malformed (retryable).

use crate::crawl::{PageError, PageResult};

/// Parses a model's extraction response into a normalized `PageResult`
pub fn parse_extraction(raw: &str) -> Result<PageResult, PageError> {
    let text = strip_code_fences(raw.trim());
    if text.is_empty() {
        return Err(PageError::malformed_output("model returned empty output"));
    }

    // The happy path: a single JSON object.
    if let Ok(mut page) = serde_json::from_str::<PageResult>(text) {
        page.normalize();
        return Ok(page);
    }

    // Recovery: some models emit one object per chunk of reasoning,
    // back to back. Fold whatever parses into one result.
    let mut merged = PageResult::default();
    let mut found = 0usize;
    let stream = serde_json::Deserializer::from_str(text).into_iter::<PageResult>();
    for parsed in stream {
        match parsed {
            Ok(page) => {
                merged.extend(page);
                found += 1;
            }
            Err(_) => break,
        }
    }

    if found == 0 {
        let preview: String = text.chars().take(120).collect();
        return Err(PageError::malformed_output(format!(
            "model output is not valid JSON: {preview}"
        )));
    }

    merged.normalize();
    Ok(merged)
}

/// Strips a surrounding markdown code fence, with or without a language tag
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag line ("json", "JSON", or nothing)
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim).unwrap_or(text)
}
