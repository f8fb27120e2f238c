//! Regex helpers shared by the HTML-scraping adapters.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub(super) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

pub(super) static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"\bhref\s*=\s*"([^"]*)""#));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"<[^>]+>"));

/// Text of the first capture group of `re`, tags stripped; empty when absent.
pub(super) fn capture_text(re: &Regex, html: &str) -> String {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default()
}

pub(super) fn clean_text(fragment: &str) -> String {
    decode_entities(&TAG_RE.replace_all(fragment, ""))
        .trim()
        .to_string()
}

pub(super) fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

pub(super) fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
