//! Field and value matching.
//!
//! A [`TextMatcher`] is the configured form (pattern + method + flags). It is
//! compiled into a [`CompiledMatcher`] right before use, either in field-name
//! mode or in value mode:
//!
//! - field-name mode: `Basic` and `Csv` are trimmed, case-insensitive literal
//!   compares; `Wildcard` and `Regex` honor `ignore_case`. Always full match.
//! - value mode: full-string match unless `partial` is set, in which case the
//!   pattern only has to be found somewhere in the value.
//!
//! A blank pattern never matches anything.

use crate::types::Metadata;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Literal text
    #[default]
    Basic,
    /// Comma-separated list of literals
    Csv,
    /// `*` and `?` wildcards
    Wildcard,
    /// Regular expression
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextMatcher {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub method: MatchMethod,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub partial: bool,
}

impl TextMatcher {
    pub fn new(pattern: impl Into<String>, method: MatchMethod) -> Self {
        Self {
            pattern: pattern.into(),
            method,
            ignore_case: false,
            partial: false,
        }
    }

    pub fn basic(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchMethod::Basic)
    }

    pub fn csv(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchMethod::Csv)
    }

    pub fn wildcard(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchMethod::Wildcard)
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchMethod::Regex)
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.pattern.trim().is_empty()
    }

    /// Compile for selecting metadata field names
    pub fn compile_for_fields(&self) -> Result<CompiledMatcher, regex::Error> {
        CompiledMatcher::build(self, true)
    }

    /// Compile for matching, counting or replacing inside values
    pub fn compile_for_values(&self) -> Result<CompiledMatcher, regex::Error> {
        CompiledMatcher::build(self, false)
    }

    /// Regex source (unanchored, without flags) for this matcher's method
    fn regex_source(&self, field_mode: bool) -> String {
        match self.method {
            MatchMethod::Basic => {
                let literal = if field_mode {
                    self.pattern.trim()
                } else {
                    self.pattern.as_str()
                };
                regex::escape(literal)
            }
            MatchMethod::Csv => {
                let items: Vec<String> = self
                    .pattern
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(regex::escape)
                    .collect();
                items.join("|")
            }
            MatchMethod::Wildcard => wildcard_to_regex(&self.pattern),
            MatchMethod::Regex => self.pattern.clone(),
        }
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() * 2);
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    source.push_str(&regex::escape(&literal));
    source
}

/// A matcher ready for use. Holds both the anchored and the unanchored
/// regex so callers can switch between whole-value and search semantics.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    full: Option<Regex>,
    search: Option<Regex>,
    literal: bool,
    partial: bool,
    field_mode: bool,
}

impl CompiledMatcher {
    fn build(matcher: &TextMatcher, field_mode: bool) -> Result<Self, regex::Error> {
        let literal = matches!(matcher.method, MatchMethod::Basic | MatchMethod::Csv);
        if matcher.is_blank() {
            return Ok(Self {
                full: None,
                search: None,
                literal,
                partial: matcher.partial,
                field_mode,
            });
        }

        let source = matcher.regex_source(field_mode);
        let case_insensitive = matcher.ignore_case || (field_mode && literal);
        let flags = if case_insensitive { "(?i)" } else { "" };

        let full = Regex::new(&format!("{flags}^(?:{source})$"))?;
        let search = Regex::new(&format!("{flags}(?:{source})"))?;

        Ok(Self {
            full: Some(full),
            search: Some(search),
            literal,
            partial: matcher.partial && !field_mode,
            field_mode,
        })
    }

    /// A matcher that matches nothing
    pub fn none() -> Self {
        Self {
            full: None,
            search: None,
            literal: true,
            partial: false,
            field_mode: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.full.is_none()
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = if self.field_mode && self.literal {
            text.trim()
        } else {
            text
        };
        match (&self.full, &self.search) {
            (Some(_), Some(search)) if self.partial => search.is_match(text),
            (Some(full), _) => full.is_match(text),
            _ => false,
        }
    }

    /// Number of non-overlapping occurrences in `text`
    pub fn count(&self, text: &str) -> usize {
        match &self.search {
            Some(search) => search.find_iter(text).count(),
            None => 0,
        }
    }

    /// Unanchored regex, when the pattern is not blank
    pub fn search_regex(&self) -> Option<&Regex> {
        self.search.as_ref()
    }

    /// Replace according to the match mode.
    ///
    /// Whole-value mode only replaces when the entire text matches. In
    /// partial mode either the first or every occurrence is replaced.
    /// Group references (`$1`, `${name}`) are expanded for regex matchers only.
    pub fn replace(&self, text: &str, replacement: &str, replace_all: bool) -> String {
        let (Some(full), Some(search)) = (&self.full, &self.search) else {
            return text.to_string();
        };
        if !self.partial {
            if !full.is_match(text) {
                return text.to_string();
            }
            return if self.literal {
                full.replace(text, NoExpand(replacement)).into_owned()
            } else {
                full.replace(text, replacement).into_owned()
            };
        }
        match (self.literal, replace_all) {
            (true, true) => search.replace_all(text, NoExpand(replacement)).into_owned(),
            (true, false) => search.replace(text, NoExpand(replacement)).into_owned(),
            (false, true) => search.replace_all(text, replacement).into_owned(),
            (false, false) => search.replace(text, replacement).into_owned(),
        }
    }
}

// ===== RESTRICTIONS =====

/// Gates a handler on the values of a metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub field: TextMatcher,
    pub value: TextMatcher,
}

impl Restriction {
    pub fn new(field: TextMatcher, value: TextMatcher) -> Self {
        Self { field, value }
    }

    pub fn matches(&self, metadata: &Metadata) -> Result<bool, regex::Error> {
        let field_matcher = self.field.compile_for_fields()?;
        let value_matcher = self.value.compile_for_values()?;
        Ok(metadata.iter().any(|(name, values)| {
            field_matcher.matches(name) && values.iter().any(|v| value_matcher.matches(v))
        }))
    }
}

/// No restrictions means always applicable; otherwise one match is enough
pub fn restrictions_match(
    restrictions: &[Restriction],
    metadata: &Metadata,
) -> Result<bool, regex::Error> {
    if restrictions.is_empty() {
        return Ok(true);
    }
    for restriction in restrictions {
        if restriction.matches(metadata)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_field_match_is_trimmed_and_case_insensitive() {
        let matcher = TextMatcher::basic(" Title ").compile_for_fields().unwrap();
        assert!(matcher.matches("title"));
        assert!(matcher.matches("TITLE"));
        assert!(!matcher.matches("subtitle"));
    }

    #[test]
    fn test_csv_field_match() {
        let matcher = TextMatcher::csv("author, title,,").compile_for_fields().unwrap();
        assert!(matcher.matches("Author"));
        assert!(matcher.matches("title"));
        assert!(!matcher.matches("date"));
    }

    #[test]
    fn test_regex_is_full_match() {
        let matcher = TextMatcher::regex("doc.*").compile_for_fields().unwrap();
        assert!(matcher.matches("document.reference"));
        assert!(!matcher.matches("my.document"));

        let matcher = TextMatcher::regex("Doc.*").compile_for_fields().unwrap();
        assert!(!matcher.matches("document"));
        let matcher = TextMatcher::regex("Doc.*")
            .ignore_case(true)
            .compile_for_fields()
            .unwrap();
        assert!(matcher.matches("document"));
    }

    #[test]
    fn test_wildcard() {
        let matcher = TextMatcher::wildcard("dc:t?tle*").compile_for_values().unwrap();
        assert!(matcher.matches("dc:title"));
        assert!(matcher.matches("dc:titles.en"));
        assert!(!matcher.matches("dc.title"));
    }

    #[test]
    fn test_blank_pattern_matches_nothing() {
        let matcher = TextMatcher::basic("  ").compile_for_fields().unwrap();
        assert!(matcher.is_blank());
        assert!(!matcher.matches(""));
        assert!(!matcher.matches("anything"));
        assert_eq!(matcher.count("anything"), 0);
        assert_eq!(matcher.replace("same", "x", true), "same");
    }

    #[test]
    fn test_partial_value_match() {
        let whole = TextMatcher::basic("apple").compile_for_values().unwrap();
        assert!(!whole.matches("apple pie"));
        let partial = TextMatcher::basic("apple")
            .partial(true)
            .compile_for_values()
            .unwrap();
        assert!(partial.matches("apple pie"));
    }

    #[test]
    fn test_replace_modes() {
        let partial = TextMatcher::basic("apple")
            .partial(true)
            .compile_for_values()
            .unwrap();
        assert_eq!(partial.replace("apple apple", "orange", true), "orange orange");
        assert_eq!(partial.replace("apple apple", "orange", false), "orange apple");

        let whole = TextMatcher::basic("apple").compile_for_values().unwrap();
        assert_eq!(whole.replace("apple pie", "orange", true), "apple pie");
        assert_eq!(whole.replace("apple", "orange", true), "orange");
    }

    #[test]
    fn test_regex_replace_expands_groups_but_literal_does_not() {
        let regex = TextMatcher::regex(r"(\w+)@(\w+)")
            .partial(true)
            .compile_for_values()
            .unwrap();
        assert_eq!(regex.replace("me@home", "$2:$1", true), "home:me");

        let literal = TextMatcher::basic("a")
            .partial(true)
            .compile_for_values()
            .unwrap();
        assert_eq!(literal.replace("a", "$1", true), "$1");
    }

    #[test]
    fn test_count_non_overlapping() {
        let matcher = TextMatcher::basic("aa").compile_for_values().unwrap();
        assert_eq!(matcher.count("aaaaa"), 2);
        let matcher = TextMatcher::regex("a+").compile_for_values().unwrap();
        assert_eq!(matcher.count("a b aa"), 2);
    }

    #[test]
    fn test_restrictions() {
        let mut metadata = Metadata::new();
        metadata.add("document.contentType", "text/html");

        assert!(restrictions_match(&[], &metadata).unwrap());

        let html = Restriction::new(
            TextMatcher::basic("document.contentType"),
            TextMatcher::regex("text/.*"),
        );
        let pdf = Restriction::new(
            TextMatcher::basic("document.contentType"),
            TextMatcher::basic("application/pdf"),
        );
        assert!(restrictions_match(&[pdf.clone(), html], &metadata).unwrap());
        assert!(!restrictions_match(&[pdf], &metadata).unwrap());
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        assert!(TextMatcher::regex("(unclosed").compile_for_values().is_err());
    }
}
