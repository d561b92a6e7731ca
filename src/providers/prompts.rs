//! System and user prompts shared by every provider backend

use crate::crawl::LevelHint;

/// System prompt for the extraction phase
///
/// The response contract here is what `parse::parse_extraction` expects: a
/// single JSON object with `data`, `next_urls`, `detail_urls` and `summary`.
pub const EXTRACT_SYSTEM_PROMPT: &str = "\
You are a web data extraction engine. You are given the content of a single \
web page and a user request describing what data to extract.

Respond with ONLY a JSON object, no prose and no code fences, in this shape:
{
  \"data\": [ { ...one object per extracted record... } ],
  \"next_urls\": [ \"absolute pagination URLs continuing this same listing\" ],
  \"detail_urls\": [ \"absolute URLs of per-item detail pages\" ],
  \"summary\": \"one sentence describing what this page contained\"
}

Rules:
- Include in each record a \"detail_url\" field with the absolute URL of the \
item's own page when one exists.
- Use absolute URLs everywhere. Resolve relative links against the page URL.
- next_urls is for pagination of the SAME listing only (next page, load more).
- detail_urls is for individual item pages only. Never mix the two.
- If the page has none of the requested data, return an empty data array.
- Omit nothing the user asked for; use null for fields you cannot find.";

/// System prompt for the understanding phase (dual-model mode)
pub const UNDERSTAND_SYSTEM_PROMPT: &str = "\
You convert raw web page HTML into clean structured markdown. Preserve all \
factual content, data values, and every link href as a markdown link. Drop \
navigation chrome, ads, and boilerplate. Respond with ONLY the markdown.";

/// Builds the extraction user message for one content chunk
pub fn extraction_request(content: &str, prompt: &str, page_url: &str, hint: LevelHint) -> String {
    let context = match hint {
        LevelHint::Listing => "This is a listing page discovered from the user's starting URL.",
        LevelHint::Detail => {
            "This is a DETAIL page for a single item found on an earlier listing page. \
             Extract the requested fields for this one item; leave next_urls and \
             detail_urls empty unless the page genuinely links to more relevant pages."
        }
    };

    format!(
        "{context}\n\nPage URL: {page_url}\n\nUser request: {prompt}\n\nPage content:\n{content}"
    )
}

/// Builds the understanding user message for one content chunk
pub fn understanding_request(content: &str, page_url: &str) -> String {
    format!("Page URL: {page_url}\n\nHTML:\n{content}")
}
