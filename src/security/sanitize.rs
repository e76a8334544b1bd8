//! Best-effort input sanitization.
//!
//! Strips the script-like constructs the public forms have actually seen
//! abused: `<script>`/`<iframe>` blocks, `javascript:` scheme prefixes and
//! inline `on<word>=` handler introducers. Runs before validation and returns
//! a new field map. This is deliberately narrow defense-in-depth, not an HTML
//! sanitizer; it must never be relied on to neutralize every injection vector.

use regex::Regex;
use std::sync::LazyLock;

use crate::validation::FieldMap;

static SCRIPT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script block regex should compile")
});

static IFRAME_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>").expect("iframe block regex should compile")
});

/// Unclosed or stray `<script ...>` / `</script>` / `<iframe ...>` tags left
/// over once whole blocks are gone.
static STRAY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:script|iframe)\b[^>]*>").expect("stray tag regex should compile")
});

static JS_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("js scheme regex should compile"));

static EVENT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("event attr regex should compile"));

/// Sanitize a single string value.
pub fn sanitize_str(input: &str) -> String {
    let out = SCRIPT_BLOCK_RE.replace_all(input, "");
    let out = IFRAME_BLOCK_RE.replace_all(&out, "");
    let out = STRAY_TAG_RE.replace_all(&out, "");
    let out = JS_SCHEME_RE.replace_all(&out, "");
    let out = EVENT_ATTR_RE.replace_all(&out, "");
    out.into_owned()
}

/// Sanitize every value of a field map, returning a new map.
pub fn sanitize_fields(fields: &FieldMap) -> FieldMap {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), sanitize_str(v)))
        .collect()
}

/// Escape the five HTML-significant characters for safe re-display.
///
/// Applied to free-text fields (message, cover letter) at normalization time,
/// after validation has counted the raw length.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_script_block_entirely() {
        assert_eq!(sanitize_str("hi <script>alert(1)</script> there"), "hi  there");
    }

    #[test]
    fn removes_script_block_case_insensitively_across_lines() {
        let input = "a<SCRIPT type=\"text/javascript\">\nalert(1)\n</ScRiPt >b";
        assert_eq!(sanitize_str(input), "ab");
    }

    #[test]
    fn removes_iframe_block_and_stray_tags() {
        assert_eq!(sanitize_str("<iframe src=x></iframe>ok"), "ok");
        assert_eq!(sanitize_str("<script>unclosed"), "unclosed");
        assert_eq!(sanitize_str("dangling</iframe>"), "dangling");
    }

    #[test]
    fn strips_javascript_scheme_prefix() {
        assert_eq!(sanitize_str("javascript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_str("JaVaScRiPt :alert(1)"), "alert(1)");
    }

    #[test]
    fn strips_inline_event_handler_introducers() {
        assert_eq!(sanitize_str("<img onerror=alert(1)>"), "<img alert(1)>");
        assert_eq!(sanitize_str("onclick = doEvil()"), " doEvil()");
    }

    #[test]
    fn plain_text_passes_through() {
        let input = "Hello, I have a question about your products.";
        assert_eq!(sanitize_str(input), input);
    }

    #[test]
    fn escape_html_covers_the_five_significant_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">O'Brien & sons</a>"#),
            "&lt;a href=&quot;x&quot;&gt;O&#39;Brien &amp; sons&lt;/a&gt;"
        );
    }
}
