use crate::handlers::{
    default_max_read_size, field_matcher, read_content, value_matcher, HandlerError, HandlerResult,
    ImporterHandler, Tagger,
};
use crate::matcher::{CompiledMatcher, Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "CountMatchesTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchCount {
    /// Counts in content when absent
    #[serde(default)]
    pub field_matcher: Option<TextMatcher>,
    pub count_matcher: TextMatcher,
    pub to_field: String,
}

/// Counts pattern occurrences in content or field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountMatchesTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub counts: Vec<MatchCount>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for CountMatchesTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            counts: Vec::new(),
            max_read_size: default_max_read_size(),
        }
    }
}

impl CountMatchesTagger {
    /// Count one content section. Section 0 starts a new document: content
    /// counts are reset there and accumulated on every following section.
    pub fn tag_section(
        &self,
        doc: &mut HandlerDoc,
        section: &str,
        section_index: usize,
    ) -> HandlerResult<()> {
        if section_index == 0 {
            self.validate()?;
        }
        for count in &self.counts {
            let counter = value_matcher(NAME, &count.count_matcher)?;

            let found = match &count.field_matcher {
                Some(fields) if !fields.is_blank() => {
                    if section_index != 0 {
                        continue;
                    }
                    let fields = field_matcher(NAME, fields)?;
                    count_in_fields(doc, &fields, &counter)
                }
                _ => counter.count(section),
            };

            let previous = if section_index == 0 {
                0
            } else {
                doc.metadata.first_int(&count.to_field).unwrap_or(0)
            };
            let total = previous + found as i64;
            doc.metadata.set(&count.to_field, vec![total.to_string()]);
        }
        Ok(())
    }
}

fn count_in_fields(doc: &HandlerDoc, fields: &CompiledMatcher, counter: &CompiledMatcher) -> usize {
    doc.metadata
        .iter()
        .filter(|(name, _)| fields.matches(name))
        .flat_map(|(_, values)| values.iter())
        .map(|value| counter.count(value))
        .sum()
}

impl ImporterHandler for CountMatchesTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }

    fn validate(&self) -> HandlerResult<()> {
        for count in &self.counts {
            if count.to_field.trim().is_empty() {
                return Err(HandlerError::config(NAME, "to_field cannot be blank"));
            }
            value_matcher(NAME, &count.count_matcher)?;
            if let Some(fields) = &count.field_matcher {
                field_matcher(NAME, fields)?;
            }
        }
        Ok(())
    }
}

impl Tagger for CountMatchesTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        let content = read_content(doc, input)?;
        for (index, section) in text::text_sections(&content, self.max_read_size)
            .into_iter()
            .enumerate()
        {
            self.tag_section(doc, section, index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn content_count(pattern: TextMatcher) -> CountMatchesTagger {
        CountMatchesTagger {
            counts: vec![MatchCount {
                field_matcher: None,
                count_matcher: pattern,
                to_field: "appleCount".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_count_in_content() {
        let tagger = content_count(TextMatcher::basic("apple").ignore_case(true));
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        tagger
            .tag(&mut doc, &mut Cursor::new("Apple, apple and pineapple."))
            .unwrap();
        assert_eq!(doc.metadata.first("appleCount"), Some("3"));
    }

    #[test]
    fn test_sections_accumulate_and_reset_on_first() {
        let tagger = content_count(TextMatcher::regex("a"));
        let mut metadata = Metadata::new();
        metadata.add("appleCount", "100");
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);

        tagger.tag_section(&mut doc, "a a", 0).unwrap();
        assert_eq!(doc.metadata.first("appleCount"), Some("2"));
        tagger.tag_section(&mut doc, "a", 1).unwrap();
        tagger.tag_section(&mut doc, "aaa", 2).unwrap();
        assert_eq!(doc.metadata.first("appleCount"), Some("6"));

        // a new document starts again at section 0
        tagger.tag_section(&mut doc, "a", 0).unwrap();
        assert_eq!(doc.metadata.first("appleCount"), Some("1"));
    }

    #[test]
    fn test_chunked_content_counts_like_whole() {
        let mut tagger = content_count(TextMatcher::basic("pear"));
        tagger.max_read_size = 16;
        let content = "pear and pear.\npear again. One more pear here.\npear";
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        tagger.tag(&mut doc, &mut Cursor::new(content)).unwrap();
        assert!(text::text_sections(content, 16).len() > 1);
        assert_eq!(doc.metadata.first("appleCount"), Some("5"));
    }

    #[test]
    fn test_count_in_fields_is_additive() {
        let tagger = CountMatchesTagger {
            counts: vec![MatchCount {
                field_matcher: Some(TextMatcher::regex("fruit.*")),
                count_matcher: TextMatcher::basic("apple"),
                to_field: "appleCount".into(),
            }],
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.add_all("fruit1", vec!["apple apple".into(), "pear".into()]);
        metadata.add("fruit2", "apple");
        metadata.add("other", "apple");
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);

        tagger.tag(&mut doc, &mut Cursor::new("apple")).unwrap();
        assert_eq!(doc.metadata.first("appleCount"), Some("3"));

        tagger.tag_section(&mut doc, "ignored", 1).unwrap();
        assert_eq!(doc.metadata.first("appleCount"), Some("3"));
    }

    #[test]
    fn test_blank_target_is_a_config_error() {
        let mut tagger = content_count(TextMatcher::basic("a"));
        let mut blank = tagger.counts[0].clone();
        blank.to_field = String::new();
        tagger.counts.push(blank);
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        assert!(matches!(
            tagger.tag(&mut doc, &mut Cursor::new("a")),
            Err(HandlerError::InvalidConfig { .. })
        ));
        assert!(!doc.metadata.contains("appleCount"));
    }
}
