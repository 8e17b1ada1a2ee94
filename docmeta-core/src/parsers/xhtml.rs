//! XHTML text extraction
//!
//! Streams the markup with quick-xml and keeps the text outside `<head>`,
//! `<script>` and `<style>`. Block elements end a paragraph, `<br>` ends a
//! line. End names are not checked so common HTML (unclosed `<meta>`,
//! `<br>`) goes through. Markup quick-xml cannot read at all falls back to a
//! regex tag stripper.

use super::ContentParser;
use crate::types::Metadata;
use anyhow::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const TITLE_FIELD: &str = "dc:title";

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?</script>|<style.*?</style>|<[^>]*>").unwrap());

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static SPACES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\f\u{a0}]+").unwrap());

static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

pub struct XhtmlParser;

#[derive(Default)]
struct Extraction {
    text: String,
    title: String,
    in_head: bool,
    in_title: bool,
    skip_depth: usize,
}

impl Extraction {
    fn start(&mut self, name: &str) {
        match name {
            "head" => self.in_head = true,
            "title" => self.in_title = true,
            "script" | "style" => self.skip_depth += 1,
            "br" => self.text.push('\n'),
            _ if BLOCK_ELEMENTS.contains(&name) => self.text.push_str("\n\n"),
            _ => {}
        }
    }

    fn end(&mut self, name: &str) {
        match name {
            "head" => self.in_head = false,
            "title" => self.in_title = false,
            "script" | "style" => self.skip_depth = self.skip_depth.saturating_sub(1),
            _ if BLOCK_ELEMENTS.contains(&name) => self.text.push_str("\n\n"),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_title {
            self.title.push_str(text);
        } else if !self.in_head && self.skip_depth == 0 {
            self.text.push_str(text);
        }
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase()
}

/// `<meta name|property|http-equiv=... content=...>` as a field and value
fn meta_field(e: &BytesStart) -> Option<(String, String)> {
    let mut name = None;
    let mut content = None;
    for attr in e.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
        let value = attr
            .unescape_value()
            .map(Cow::into_owned)
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        match key.as_str() {
            "name" | "property" | "http-equiv" => name = Some(value),
            "content" => content = Some(value),
            _ => {}
        }
    }
    match (name, content) {
        (Some(name), Some(content)) if !name.trim().is_empty() => Some((name.trim().to_string(), content)),
        _ => None,
    }
}

/// Collapse horizontal whitespace, trim lines and keep at most one blank line
fn normalize(text: &str) -> String {
    let text = SPACES_REGEX.replace_all(text, " ");
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES_REGEX
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

fn extract(markup: &str, metadata: &mut Metadata) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(markup);
    reader.check_end_names(false);

    let mut state = Extraction::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e);
                if name == "meta" {
                    if let Some((field, value)) = meta_field(&e) {
                        metadata.add(&field, value);
                    }
                }
                state.start(&name);
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                if name == "meta" {
                    if let Some((field, value)) = meta_field(&e) {
                        metadata.add(&field, value);
                    }
                }
                state.start(&name);
                state.end(&name);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                state.end(&name);
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                state.text(&text);
            }
            Event::CData(e) => state.text(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
    }

    let title = state.title.split_whitespace().collect::<Vec<_>>().join(" ");
    if !title.is_empty() {
        metadata.add(TITLE_FIELD, title);
    }
    Ok(normalize(&state.text))
}

fn strip_tags(markup: &str, metadata: &mut Metadata) -> String {
    if let Some(title) = TITLE_REGEX.captures(markup).and_then(|c| c.get(1)) {
        let title = title.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
        if !title.is_empty() {
            metadata.add(TITLE_FIELD, title);
        }
    }
    let body = match markup.find("</head>") {
        Some(i) => &markup[i..],
        None => markup,
    };
    normalize(&TAG_REGEX.replace_all(body, "\n"))
}

impl ContentParser for XhtmlParser {
    fn parse(&self, reference: &str, content: &[u8], metadata: &mut Metadata) -> Result<Vec<u8>> {
        let markup = String::from_utf8_lossy(content);

        // collect into a scratch copy so a failed pass leaves metadata untouched
        let mut found = Metadata::new();
        let text = match extract(&markup, &mut found) {
            Ok(text) => text,
            Err(e) => {
                warn!(parser = "XhtmlParser", reference, error = %e, "markup not readable, stripping tags instead");
                found = Metadata::new();
                strip_tags(&markup, &mut found)
            }
        };
        for (field, values) in found.iter() {
            metadata.add_all(field, values.to_vec());
        }
        debug!(parser = "XhtmlParser", reference, fields = found.len(), chars = text.len(), "XHTML parsed");
        Ok(text.into_bytes())
    }

    fn name(&self) -> &str {
        "XhtmlParser"
    }

    fn supports_content_type(&self, content_type: &str) -> bool {
        let content_type = content_type.to_lowercase();
        content_type.contains("html") || content_type.contains("xml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Apple   Pie</title>
  <meta charset="utf-8">
  <meta name="author" content="Jo &amp; Al">
  <meta property="og:type" content="article"/>
  <style>p { color: red; }</style>
</head>
<body>
  <h1>Apple Pie</h1>
  <p>Peel the <b>apples</b>.<br>Bake   them.</p>
  <script>var x = 1;</script>
  <div>Serve warm.</div>
</body>
</html>"#;

    #[test]
    fn test_text_title_and_meta() {
        let mut metadata = Metadata::new();
        let text = XhtmlParser.parse("pie.html", PAGE.as_bytes(), &mut metadata).unwrap();
        let text = String::from_utf8(text).unwrap();

        assert_eq!(text, "Apple Pie\n\nPeel the apples.\nBake them.\n\nServe warm.");
        assert_eq!(metadata.first(TITLE_FIELD), Some("Apple Pie"));
        assert_eq!(metadata.first("author"), Some("Jo & Al"));
        assert_eq!(metadata.first("og:type"), Some("article"));
        assert!(!metadata.contains("charset"));
    }

    #[test]
    fn test_unreadable_markup_falls_back_to_tag_stripping() {
        let mut metadata = Metadata::new();
        let html = "<html><head><title>T</title></head><body><p>a <b>b</b></p><!-- never closed";
        let text = XhtmlParser.parse("bad.html", html.as_bytes(), &mut metadata).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with('a'));
        assert!(text.contains('b'));
        assert!(!text.contains("<b>"));
        assert_eq!(metadata.first(TITLE_FIELD), Some("T"));
    }
}
