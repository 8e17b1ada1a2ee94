use crate::handlers::{
    default_max_read_size, field_matcher, read_content, HandlerError, HandlerResult,
    ImporterHandler, Tagger,
};
use crate::matcher::{Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "TextPatternTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextPattern {
    pub to_field: String,
    /// Always used as a regular expression
    pub pattern: TextMatcher,
    /// Group name or index, the whole match when absent
    #[serde(default)]
    pub group: Option<String>,
}

/// Stores every match of a regular expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPatternTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    /// Reads from matching fields instead of the content
    #[serde(default)]
    pub field_matcher: Option<TextMatcher>,
    pub patterns: Vec<TextPattern>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for TextPatternTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            field_matcher: None,
            patterns: Vec::new(),
            max_read_size: default_max_read_size(),
        }
    }
}

fn group_text<'a>(caps: &Captures<'a>, group: Option<&str>) -> Option<&'a str> {
    let m = match group {
        None => caps.get(0),
        Some(group) => match group.parse::<usize>() {
            Ok(index) => caps.get(index),
            Err(_) => caps.name(group),
        },
    };
    m.map(|m| m.as_str())
}

impl ImporterHandler for TextPatternTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for TextPatternTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        let sources: Vec<String> = match &self.field_matcher {
            Some(fields) => {
                let matcher = field_matcher(NAME, fields)?;
                doc.metadata
                    .iter()
                    .filter(|(name, _)| matcher.matches(name))
                    .flat_map(|(_, values)| values.iter().cloned())
                    .collect()
            }
            None => {
                let content = read_content(doc, input)?;
                text::text_sections(&content, self.max_read_size)
                    .into_iter()
                    .map(String::from)
                    .collect()
            }
        };

        for pattern in &self.patterns {
            if pattern.to_field.trim().is_empty() {
                return Err(HandlerError::config(NAME, "to_field cannot be blank"));
            }
            if pattern.pattern.is_blank() {
                return Err(HandlerError::config(NAME, "pattern cannot be blank"));
            }
            let regex: Regex = RegexBuilder::new(&pattern.pattern.pattern)
                .case_insensitive(pattern.pattern.ignore_case)
                .build()
                .map_err(|e| HandlerError::config(NAME, format!("bad pattern: {e}")))?;

            let mut found: Vec<String> = Vec::new();
            for source in &sources {
                for caps in regex.captures_iter(source) {
                    if let Some(text) = group_text(&caps, pattern.group.as_deref()) {
                        if !text.is_empty() && !found.iter().any(|f| f == text) {
                            found.push(text.to_string());
                        }
                    }
                }
            }
            doc.metadata.add_all(&pattern.to_field, found);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    #[test]
    fn test_patterns_from_content() {
        let tagger = TextPatternTagger {
            patterns: vec![
                TextPattern {
                    to_field: "emails".into(),
                    pattern: TextMatcher::regex(r"[\w.]+@[\w.]+\w"),
                    group: None,
                },
                TextPattern {
                    to_field: "users".into(),
                    pattern: TextMatcher::regex(r"(?P<user>[\w.]+)@"),
                    group: Some("user".into()),
                },
                TextPattern {
                    to_field: "domains".into(),
                    pattern: TextMatcher::regex(r"@([\w.]+\w)"),
                    group: Some("1".into()),
                },
            ],
            ..Default::default()
        };
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        let content = "Write to jo@example.com or al@example.org. Again: jo@example.com.";
        tagger.tag(&mut doc, &mut Cursor::new(content)).unwrap();

        assert_eq!(
            doc.metadata.get("emails").unwrap(),
            &["jo@example.com", "al@example.org"].map(String::from)
        );
        assert_eq!(doc.metadata.get("users").unwrap(), &["jo", "al"].map(String::from));
        assert_eq!(
            doc.metadata.get("domains").unwrap(),
            &["example.com", "example.org"].map(String::from)
        );
    }

    #[test]
    fn test_pattern_on_fields_ignoring_case() {
        let tagger = TextPatternTagger {
            field_matcher: Some(TextMatcher::basic("title")),
            patterns: vec![TextPattern {
                to_field: "year".into(),
                pattern: TextMatcher::regex(r"edition (\d{4})").ignore_case(true),
                group: Some("1".into()),
            }],
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.add("title", "Cookbook, Edition 2021");
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);
        tagger.tag(&mut doc, &mut Cursor::new("edition 1999")).unwrap();
        assert_eq!(doc.metadata.get("year").unwrap(), &["2021".to_string()]);
    }
}
