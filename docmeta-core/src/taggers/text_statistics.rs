use crate::handlers::{default_max_read_size, read_content, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::text;
use crate::types::{HandlerDoc, Metadata};
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "TextStatisticsTagger";

/// Counts gathered over one or more pieces of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStatistics {
    pub character_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub word_character_count: usize,
    pub sentence_character_count: usize,
    pub paragraph_character_count: usize,
}

fn average(total: usize, count: usize) -> String {
    if count == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", total as f64 / count as f64)
}

impl TextStatistics {
    pub fn add_text(&mut self, text: &str) {
        self.character_count += text.chars().count();
        for word in text::words(text) {
            self.word_count += 1;
            self.word_character_count += word.chars().count();
        }
        for sentence in text::sentences(text) {
            self.sentence_count += 1;
            self.sentence_character_count += sentence.trim().chars().count();
        }
        for paragraph in text::paragraphs(text) {
            self.paragraph_count += 1;
            self.paragraph_character_count += paragraph.trim().chars().count();
        }
    }

    pub fn of(text: &str) -> Self {
        let mut stats = Self::default();
        stats.add_text(text);
        stats
    }

    /// Write every statistic under `<prefix>.stat.`
    pub fn store(&self, metadata: &mut Metadata, prefix: &str) {
        let entries = [
            ("characterCount", self.character_count.to_string()),
            ("wordCount", self.word_count.to_string()),
            ("sentenceCount", self.sentence_count.to_string()),
            ("paragraphCount", self.paragraph_count.to_string()),
            (
                "averageWordCharacterCount",
                average(self.word_character_count, self.word_count),
            ),
            (
                "averageSentenceCharacterCount",
                average(self.sentence_character_count, self.sentence_count),
            ),
            (
                "averageSentenceWordCount",
                average(self.word_count, self.sentence_count),
            ),
            (
                "averageParagraphCharacterCount",
                average(self.paragraph_character_count, self.paragraph_count),
            ),
            (
                "averageParagraphSentenceCount",
                average(self.sentence_count, self.paragraph_count),
            ),
            (
                "averageParagraphWordCount",
                average(self.word_count, self.paragraph_count),
            ),
        ];
        for (key, value) in entries {
            metadata.set(&format!("{prefix}.stat.{key}"), vec![value]);
        }
    }
}

/// Computes word, sentence and paragraph statistics on content or a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatisticsTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    /// Analyzes this field instead of the content
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for TextStatisticsTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            field_name: None,
            max_read_size: default_max_read_size(),
        }
    }
}

impl ImporterHandler for TextStatisticsTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for TextStatisticsTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        let mut stats = TextStatistics::default();
        let prefix = match self.field_name.as_deref().filter(|f| !f.trim().is_empty()) {
            Some(field) => {
                for value in doc.metadata.get(field).unwrap_or_default() {
                    stats.add_text(value);
                }
                field.to_string()
            }
            None => {
                let content = read_content(doc, input)?;
                for section in text::text_sections(&content, self.max_read_size) {
                    stats.add_text(section);
                }
                "document".to_string()
            }
        };
        stats.store(&mut doc.metadata, &prefix);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParseState;
    use std::io::Cursor;

    const TEXT: &str = "The quick fox jumps. It runs away!\n\nA dog barks.";

    #[test]
    fn test_counts() {
        let stats = TextStatistics::of(TEXT);
        assert_eq!(stats.character_count, TEXT.chars().count());
        assert_eq!(stats.word_count, 10);
        assert_eq!(stats.sentence_count, 3);
        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.word_character_count, 35);
    }

    #[test]
    fn test_content_statistics_fields() {
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        TextStatisticsTagger::default()
            .tag(&mut doc, &mut Cursor::new(TEXT))
            .unwrap();
        let m = &doc.metadata;
        assert_eq!(m.first("document.stat.wordCount"), Some("10"));
        assert_eq!(m.first("document.stat.sentenceCount"), Some("3"));
        assert_eq!(m.first("document.stat.averageWordCharacterCount"), Some("3.5"));
        assert_eq!(m.first("document.stat.averageSentenceWordCount"), Some("3.3"));
        assert_eq!(m.first("document.stat.averageParagraphSentenceCount"), Some("1.5"));
        assert_eq!(m.len(), 10);
    }

    #[test]
    fn test_field_statistics_and_empty_text() {
        let mut metadata = Metadata::new();
        metadata.add("summary", "");
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);
        let tagger = TextStatisticsTagger {
            field_name: Some("summary".into()),
            ..Default::default()
        };
        tagger.tag(&mut doc, &mut Cursor::new(TEXT)).unwrap();
        assert_eq!(doc.metadata.first("summary.stat.wordCount"), Some("0"));
        assert_eq!(
            doc.metadata.first("summary.stat.averageSentenceWordCount"),
            Some("0.0")
        );
        assert!(!doc.metadata.contains("document.stat.wordCount"));
    }
}
