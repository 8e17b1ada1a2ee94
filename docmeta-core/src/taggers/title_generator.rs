use crate::handlers::{default_max_read_size, read_content, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

const NAME: &str = "TitleGeneratorTagger";

pub const DEFAULT_TITLE_FIELD: &str = "document.generatedTitle";

/// Words shorter than this carry no weight
const MIN_TERM_LENGTH: usize = 3;
/// Shorter sentences only compete when no longer one exists
const MIN_SENTENCE_WORDS: usize = 3;

fn default_to_field() -> String {
    DEFAULT_TITLE_FIELD.to_string()
}

fn default_title_max_length() -> usize {
    150
}

fn default_heading_min_length() -> usize {
    10
}

fn default_heading_max_length() -> usize {
    150
}

/// Guesses a title from the text: a leading heading when asked to detect
/// one, otherwise the sentence whose words are the most frequent overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleGeneratorTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    /// Uses the content when absent
    #[serde(default)]
    pub from_field: Option<String>,
    #[serde(default = "default_to_field")]
    pub to_field: String,
    #[serde(default = "default_title_max_length")]
    pub title_max_length: usize,
    #[serde(default)]
    pub detect_heading: bool,
    #[serde(default = "default_heading_min_length")]
    pub detect_heading_min_length: usize,
    #[serde(default = "default_heading_max_length")]
    pub detect_heading_max_length: usize,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for TitleGeneratorTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            from_field: None,
            to_field: default_to_field(),
            title_max_length: default_title_max_length(),
            detect_heading: false,
            detect_heading_min_length: default_heading_min_length(),
            detect_heading_max_length: default_heading_max_length(),
            overwrite: false,
            max_read_size: default_max_read_size(),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl TitleGeneratorTagger {
    fn heading(&self, text: &str) -> Option<String> {
        let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
        let length = line.chars().count();
        if text::sentences(line).len() == 1
            && length >= self.detect_heading_min_length
            && length <= self.detect_heading_max_length
        {
            return Some(line.to_string());
        }
        None
    }

    /// Best sentence by average term frequency, ties going to the first
    pub fn generate(&self, text: &str) -> Option<String> {
        if self.detect_heading {
            if let Some(heading) = self.heading(text) {
                return Some(self.clip(&heading));
            }
        }

        let mut frequencies: HashMap<String, usize> = HashMap::new();
        for word in text::words(text) {
            if word.chars().count() >= MIN_TERM_LENGTH {
                *frequencies.entry(word.to_lowercase()).or_insert(0) += 1;
            }
        }

        let sentences: Vec<(&str, Vec<&str>)> = text::sentences(text)
            .into_iter()
            .map(|sentence| (sentence, text::words(sentence).collect::<Vec<_>>()))
            .filter(|(_, words)| !words.is_empty())
            .collect();
        let long_enough = sentences
            .iter()
            .any(|(_, words)| words.len() >= MIN_SENTENCE_WORDS);

        let mut best: Option<(&str, f64)> = None;
        for (sentence, words) in &sentences {
            if long_enough && words.len() < MIN_SENTENCE_WORDS {
                continue;
            }
            let weight: usize = words
                .iter()
                .filter(|w| w.chars().count() >= MIN_TERM_LENGTH)
                .map(|w| frequencies.get(&w.to_lowercase()).copied().unwrap_or(0))
                .sum();
            let score = weight as f64 / words.len() as f64;
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((*sentence, score));
            }
        }
        best.map(|(sentence, _)| self.clip(&collapse_whitespace(sentence)))
    }

    fn clip(&self, title: &str) -> String {
        if self.title_max_length == 0 {
            return title.to_string();
        }
        text::abbreviate(title, self.title_max_length)
    }
}

impl ImporterHandler for TitleGeneratorTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for TitleGeneratorTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        let to_field = if self.to_field.trim().is_empty() {
            DEFAULT_TITLE_FIELD
        } else {
            self.to_field.as_str()
        };
        let has_title = doc
            .metadata
            .get(to_field)
            .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
        if has_title && !self.overwrite {
            debug!(handler = NAME, reference = %doc.reference, field = to_field, "title already present");
            return Ok(());
        }

        let text = match self.from_field.as_deref().filter(|f| !f.trim().is_empty()) {
            Some(field) => doc.metadata.get(field).unwrap_or_default().join("\n"),
            None => {
                let content = read_content(doc, input)?;
                // only the first section is analyzed
                text::text_sections(&content, self.max_read_size)
                    .first()
                    .map(|s| s.to_string())
                    .unwrap_or_default()
            }
        };

        match self.generate(&text) {
            Some(title) => doc.metadata.set(to_field, vec![title]),
            None => debug!(handler = NAME, reference = %doc.reference, "no title could be generated"),
        }
        Ok(())
    }
}
