//! Minimal HTML size reduction for the AI pipeline
//!
//! The understanding/extraction models do the real reading. This module only
//! strips script and style bodies, comments, boilerplate elements and
//! redundant whitespace to cut token cost. Tags and attributes are preserved
//! so the model can still see links and image sources.

use regex::RegexBuilder;

/// Strips script/style bodies, boilerplate elements, comments and whitespace
pub fn clean_html(raw_html: &str) -> String {
    let mut text = raw_html.to_string();

    for pattern in [
        r"<script[^>]*>.*?</script>",
        r"<style[^>]*>.*?</style>",
        r"<!--.*?-->",
        r"<nav[^>]*>.*?</nav>",
        r"<footer[^>]*>.*?</footer>",
        r"<iframe[^>]*>.*?</iframe>",
        r"<noscript[^>]*>.*?</noscript>",
    ] {
        let re = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .case_insensitive(true)
            .build()
            .expect("static pattern");
        text = re.replace_all(&text, "").into_owned();
    }

    // Collapse whitespace, then break between tags for readability
    let ws = regex::Regex::new(r"\s+").expect("static pattern");
    text = ws.replace_all(&text, " ").into_owned();
    let between_tags = regex::Regex::new(r">\s*<").expect("static pattern");
    text = between_tags.replace_all(&text, ">\n<").into_owned();

    text.trim().to_string()
}

/// Splits text into chunks that fit a provider's context window
///
/// Uses a ~4 chars/token heuristic; the default 48k chars is roughly 12k
/// tokens. Splits on blank-line boundaries when present, otherwise on single
/// newlines (cleaned HTML only has newlines between tags).
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }

    let sep = if text.contains("\n\n") { "\n\n" } else { "\n" };
    let lines: Vec<&str> = text.split(sep).collect();

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for line in lines {
        let line_size = line.len() + sep.len();
        if current_size + line_size > max_chars && !current.is_empty() {
            chunks.push(current.join(sep));
            current = vec![line];
            current_size = line_size;
        } else {
            current.push(line);
            current_size += line_size;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(sep));
    }

    chunks
}
