// Text utilities shared by the string-based handlers
//
// Content is read once as UTF-8 (invalid sequences replaced) and handed to
// handlers in sections of bounded size, broken at the most natural boundary
// available in the second half of the window.

use regex::Regex;
use std::io::Read;
use std::ops::Range;
use std::sync::LazyLock;

/// Default number of characters handed to a handler at once
pub const DEFAULT_MAX_READ_SIZE: usize = 10_000;

/// Run of non-terminators closed by `.`, `!` or `?` (optionally followed by a
/// quote) before whitespace or the end of text, or a trailing fragment.
/// Terminators glued to the next word ("e.g", "3.5") do not end a sentence.
static SENTENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:[^.!?]|[.!?]+[^.!?\s"'”’])+(?:[.!?]+["'”’]?(?:\s+|$)|$)|[.!?]+["'”’]?(?:\s+|$)"#,
    )
    .unwrap()
});

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*").unwrap());

static PARAGRAPH_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r\f]*\n").unwrap());

pub fn read_text(input: &mut dyn Read) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Split text into sections of at most `max_read_size` characters.
///
/// Empty text yields a single empty section so section 0 always exists.
pub fn text_sections(text: &str, max_read_size: usize) -> Vec<&str> {
    let max_read_size = max_read_size.max(1);
    let mut sections = Vec::new();
    let mut rest = text;

    loop {
        let window_end = match rest.char_indices().nth(max_read_size) {
            Some((byte_index, _)) => byte_index,
            None => {
                sections.push(rest);
                return sections;
            }
        };
        let cut = best_break(&rest[..window_end]).unwrap_or(window_end);
        sections.push(&rest[..cut]);
        rest = &rest[cut..];
        if rest.is_empty() {
            return sections;
        }
    }
}

/// Byte offset right after the preferred break in the second half of `window`
fn best_break(window: &str) -> Option<usize> {
    let mut half = window.len() / 2;
    while !window.is_char_boundary(half) {
        half -= 1;
    }
    let tail = &window[half..];

    let candidates = [
        tail.rfind("\n\n").map(|i| i + 2),
        tail.rfind('\n').map(|i| i + 1),
        tail.rfind(". ").map(|i| i + 2),
        tail.rfind(char::is_whitespace)
            .map(|i| i + tail[i..].chars().next().map_or(1, char::len_utf8)),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|i| half + i)
        .find(|&i| i > 0)
}

/// Byte ranges of the sentences in `text`
pub fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    SENTENCE_REGEX
        .find_iter(text)
        .filter(|m| !m.as_str().trim().is_empty())
        .map(|m| m.range())
        .collect()
}

/// Sentences in order, each including its trailing whitespace
pub fn sentences(text: &str) -> Vec<&str> {
    sentence_ranges(text)
        .into_iter()
        .map(|range| &text[range])
        .collect()
}

pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_REGEX.find_iter(text).map(|m| m.as_str())
}

pub fn paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK_REGEX
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .collect()
}

/// Shorten to `max_chars`, ending with `...` when something was cut
pub fn abbreviate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let head: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", head.trim_end())
}

/// Expand the escape sequences accepted in configuration strings
pub fn unescape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('s') => result.push(' '),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}
