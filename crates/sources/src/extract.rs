//! Small helpers for pulling text and attributes out of scraped markup.
//!
//! The review sites only need a handful of values from each page, so these
//! work on the raw HTML with regular expressions rather than building a DOM.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Text content of an HTML fragment: tags removed, entities decoded,
/// whitespace collapsed and trimmed.
pub fn text_content(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

/// Replace every run of whitespace with a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Decode the handful of entities that show up in titles.
pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Value of a double-quoted attribute inside the attribute section of a tag.
pub fn attr(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?i)(?:^|\s){}\s*=\s*"([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(attrs)
        .and_then(|caps| caps.get(1))
        .map(|value| decode_entities(value.as_str()))
}

/// Inner markup of the first element carrying `class`, up to its matching
/// closing tag. Runs to the end of `html` when the element is never closed.
pub fn element_by_class<'a>(html: &'a str, class: &str) -> Option<&'a str> {
    let pattern = format!(
        r#"(?i)<([a-z][a-z0-9-]*)\b[^>]*\bclass\s*=\s*"(?:[^"]*\s)?{}(?:\s[^"]*)?"[^>]*>"#,
        regex::escape(class)
    );
    let open = Regex::new(&pattern).ok()?.captures(html)?;
    let tag = open.get(1)?.as_str();
    let start = open.get(0)?.end();
    let inner = &html[start..];

    let tags = Regex::new(&format!(r"(?i)<(/?){}(?:\s[^>]*)?>", regex::escape(tag))).ok()?;
    let mut depth = 1;
    for caps in tags.captures_iter(inner) {
        if caps.get(1).is_some_and(|slash| slash.is_empty()) {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return caps.get(0).map(|close| &inner[..close.start()]);
            }
        }
    }

    Some(inner)
}

/// Number at the start of `text`, like "8.1" in "8.1/10".
pub fn leading_number(text: &str) -> Option<f32> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    text[..end].parse().ok()
}

/// Resolve a link found on `base` to an absolute URL.
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base, href)
    }
}
