use crate::handlers::{
    default_max_read_size, field_matcher, read_content, value_matcher, HandlerError, HandlerResult,
    ImporterHandler, Tagger,
};
use crate::matcher::{Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "TextBetweenTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBetween {
    pub to_field: String,
    pub start: TextMatcher,
    pub end: TextMatcher,
    /// Keep the start and end markers in the extracted text
    #[serde(default)]
    pub inclusive: bool,
}

/// Extracts the text found between start and end markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBetweenTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    /// Reads from matching fields instead of the content
    #[serde(default)]
    pub field_matcher: Option<TextMatcher>,
    pub operations: Vec<TextBetween>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for TextBetweenTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            field_matcher: None,
            operations: Vec::new(),
            max_read_size: default_max_read_size(),
        }
    }
}

/// Every start..end span in `text`, scanning left to right
pub fn extract_between<'a>(text: &'a str, start: &Regex, end: &Regex, inclusive: bool) -> Vec<&'a str> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(s) = start.find_at(text, from) {
        let Some(e) = end.find_at(text, s.end()) else {
            break;
        };
        spans.push(if inclusive {
            &text[s.start()..e.end()]
        } else {
            &text[s.end()..e.start()]
        });
        if e.end() > from {
            from = e.end();
        } else {
            // empty markers matched without moving forward
            match text[from..].chars().next() {
                Some(ch) => from += ch.len_utf8(),
                None => break,
            }
        }
    }
    spans
}

impl TextBetweenTagger {
    fn sources(&self, doc: &HandlerDoc, input: &mut dyn Read) -> HandlerResult<Vec<String>> {
        match &self.field_matcher {
            Some(fields) => {
                let matcher = field_matcher(NAME, fields)?;
                Ok(doc
                    .metadata
                    .iter()
                    .filter(|(name, _)| matcher.matches(name))
                    .flat_map(|(_, values)| values.iter().cloned())
                    .collect())
            }
            None => {
                let content = read_content(doc, input)?;
                Ok(text::text_sections(&content, self.max_read_size)
                    .into_iter()
                    .map(String::from)
                    .collect())
            }
        }
    }
}

impl ImporterHandler for TextBetweenTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for TextBetweenTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        let sources = self.sources(doc, input)?;
        for op in &self.operations {
            if op.to_field.trim().is_empty() {
                return Err(HandlerError::config(NAME, "to_field cannot be blank"));
            }
            let start = value_matcher(NAME, &op.start)?;
            let end = value_matcher(NAME, &op.end)?;
            let (Some(start), Some(end)) = (start.search_regex(), end.search_regex()) else {
                return Err(HandlerError::config(NAME, "start and end cannot be blank"));
            };
            let found: Vec<String> = sources
                .iter()
                .flat_map(|source| extract_between(source, start, end, op.inclusive))
                .map(String::from)
                .collect();
            doc.metadata.add_all(&op.to_field, found);
        }
        Ok(())
    }
}
