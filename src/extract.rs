//! Body-text extraction for fetched pages (HTML, PDF, plain text).
//!
//! Fetching is the scraper's job; this module turns bytes plus a
//! content type into plain UTF-8 text, or an error the caller treats as
//! "no content".

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MIME_HTML: &str = "text/html";
pub const MIME_XHTML: &str = "application/xhtml+xml";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Extract plain text from `bytes`. `content_type` may carry parameters
/// such as `; charset=utf-8`.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match essence(content_type).as_str() {
        MIME_HTML | MIME_XHTML => Ok(html_to_text(&String::from_utf8_lossy(bytes))),
        MIME_PDF => extract_pdf(bytes),
        MIME_TEXT => Ok(normalize_lines(&String::from_utf8_lossy(bytes))),
        other => Err(ExtractError::UnsupportedContentType(other.to_string())),
    }
}

/// `"Text/HTML; charset=UTF-8"` → `"text/html"`.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map(|text| normalize_lines(&text))
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

static COMMENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").ok());

// The regex crate has no backreferences, so one pattern per dropped element.
static DROPPED_ELEMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "template", "svg", "nav", "aside", "form"]
        .iter()
        .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
        .collect()
});

static MAIN_REGIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["article", "main", "body"]
        .iter()
        .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>")).ok())
        .collect()
});

static BLOCK_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(p|div|br|hr|li|ul|ol|dl|dt|dd|h[1-6]|table|tr|td|th|thead|tbody|section|article|main|header|footer|blockquote|pre|figure|figcaption)\b[^>]*>",
    )
    .ok()
});

static ANY_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());

/// Reduce an HTML page to its readable text.
///
/// Comments and non-content elements are removed, the first `<article>`,
/// `<main>` or `<body>` region is preferred over the whole page, block
/// elements become line breaks, entities are decoded, and blank lines are
/// dropped.
pub fn html_to_text(html: &str) -> String {
    let mut text = replace_all(&COMMENT, html, "");
    for re in DROPPED_ELEMENTS.iter() {
        text = re.replace_all(&text, "").into_owned();
    }

    let region = MAIN_REGIONS
        .iter()
        .find_map(|re| {
            re.captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .filter(|inner| !inner.trim().is_empty())
        })
        .unwrap_or(text);

    let region = replace_all(&BLOCK_TAG, &region, "\n");
    let region = replace_all(&ANY_TAG, &region, "");
    normalize_lines(&region)
        .lines()
        .map(decode_entities)
        .collect::<Vec<_>>()
        .join("\n")
}

fn replace_all(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match &**re {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Decode HTML entities; a line with a malformed entity is kept as is.
fn decode_entities(line: &str) -> String {
    quick_xml::escape::unescape_with(line, quick_xml::escape::resolve_html5_entity)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| line.to_string())
}

/// Collapse runs of whitespace inside each line and drop blank lines.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_and_drops_scripts() {
        let html = r#"<html><head><title>T</title><style>.x{}</style></head>
            <body><nav>Home | About</nav>
            <article><h1>Foxes</h1><p>Foxes are <b>quick</b>.</p>
            <script>var x = 1;</script><!-- hidden --><p>They  live
            in dens.</p></article>
            <footer>Copyright</footer></body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "Foxes\nFoxes are quick.\nThey live\nin dens.");
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><body><div>One</div><div>Two</div></body></html>";
        assert_eq!(html_to_text(html), "One\nTwo");
    }

    #[test]
    fn test_decodes_entities() {
        let html = "<p>Fish &amp; chips&nbsp;&lt;3 &#169;</p>";
        assert_eq!(html_to_text(html), "Fish & chips\u{a0}<3 \u{a9}");
    }

    #[test]
    fn test_malformed_entity_keeps_line() {
        assert_eq!(html_to_text("<p>AT&T rocks</p>"), "AT&T rocks");
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text(b"line one\n\n  line   two  \n", "text/plain; charset=utf-8").unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = extract_text(b"\x89PNG", "image/png").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedContentType(ct) if ct == "image/png"));
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
