use crate::handlers::{field_matcher, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use tracing::warn;

const NAME: &str = "CharacterCaseTagger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Upper,
    Lower,
    /// First letter of every word, rest untouched
    Words,
    #[serde(alias = "wordsFully")]
    WordsFully,
    /// First letter of every sentence, rest untouched
    Sentences,
    #[serde(alias = "sentencesFully")]
    SentencesFully,
    /// First letter of the whole value, rest untouched
    String,
    #[serde(alias = "stringFully")]
    StringFully,
    Swap,
    /// Anything else found in configuration
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyTo {
    #[default]
    Value,
    Field,
    Both,
}

/// Changes the character case of field values and/or field names
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterCaseTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
    #[serde(default)]
    pub case_type: Option<CaseType>,
    #[serde(default)]
    pub apply_to: ApplyTo,
}

impl CharacterCaseTagger {
    pub fn new(field_matcher: TextMatcher, case_type: CaseType, apply_to: ApplyTo) -> Self {
        Self {
            restrict_to: Vec::new(),
            field_matcher,
            case_type: Some(case_type),
            apply_to,
        }
    }
}

impl ImporterHandler for CharacterCaseTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for CharacterCaseTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        let case_type = match self.case_type {
            None => {
                warn!(handler = NAME, reference = %doc.reference, "no case type configured, nothing changed");
                return Ok(());
            }
            Some(CaseType::Unsupported) => {
                warn!(handler = NAME, reference = %doc.reference, "unsupported case type, nothing changed");
                return Ok(());
            }
            Some(case_type) => case_type,
        };

        let matcher = field_matcher(NAME, &self.field_matcher)?;
        for field in doc.metadata.matching_fields(&matcher) {
            let mut field = field;
            if matches!(self.apply_to, ApplyTo::Field | ApplyTo::Both) {
                let renamed = change_case(&field, case_type);
                doc.metadata.rename(&field, &renamed);
                field = renamed;
            }
            if matches!(self.apply_to, ApplyTo::Value | ApplyTo::Both) {
                if let Some(values) = doc.metadata.get(&field) {
                    let changed = values.iter().map(|v| change_case(v, case_type)).collect();
                    doc.metadata.set(&field, changed);
                }
            }
        }
        Ok(())
    }
}

pub fn change_case(value: &str, case_type: CaseType) -> String {
    match case_type {
        CaseType::Upper => value.to_uppercase(),
        CaseType::Lower => value.to_lowercase(),
        CaseType::Words => capitalize_words(value),
        CaseType::WordsFully => capitalize_words(&value.to_lowercase()),
        CaseType::Sentences => capitalize_sentences(value),
        CaseType::SentencesFully => capitalize_sentences(&value.to_lowercase()),
        CaseType::String => capitalize_string(value),
        CaseType::StringFully => capitalize_string(&value.to_lowercase()),
        CaseType::Swap => swap_case(value),
        CaseType::Unsupported => value.to_string(),
    }
}

fn capitalize_words(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            result.push(ch);
        } else if at_word_start {
            result.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            result.push(ch);
        }
    }
    result
}

fn capitalize_sentences(value: &str) -> String {
    // first letter of every sentence
    let starts: HashSet<usize> = text::sentence_ranges(value)
        .into_iter()
        .filter_map(|range| {
            value[range.clone()]
                .char_indices()
                .find(|(_, ch)| ch.is_alphabetic())
                .map(|(i, _)| range.start + i)
        })
        .collect();

    let mut result = String::with_capacity(value.len());
    for (i, ch) in value.char_indices() {
        if starts.contains(&i) {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
    }
    result
}

fn capitalize_string(value: &str) -> String {
    match value.char_indices().find(|(_, ch)| ch.is_alphabetic()) {
        Some((i, ch)) => {
            let mut result = String::with_capacity(value.len());
            result.push_str(&value[..i]);
            result.extend(ch.to_uppercase());
            result.push_str(&value[i + ch.len_utf8()..]);
            result
        }
        None => value.to_string(),
    }
}

fn swap_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_uppercase() {
            result.extend(ch.to_lowercase());
        } else if ch.is_lowercase() {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn doc_with(field: &str, values: &[&str]) -> HandlerDoc {
        let mut metadata = Metadata::new();
        metadata.add_all(field, values.iter().map(|v| v.to_string()).collect());
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    fn run(tagger: &CharacterCaseTagger, doc: &mut HandlerDoc) {
        tagger.tag(doc, &mut Cursor::new(b"")).unwrap();
    }

    #[test]
    fn test_lower_value() {
        let tagger = CharacterCaseTagger::new(TextMatcher::basic("title"), CaseType::Lower, ApplyTo::Value);
        let mut doc = doc_with("title", &["Apple Pie"]);
        run(&tagger, &mut doc);
        assert_eq!(doc.metadata.get("title").unwrap(), &["apple pie".to_string()]);
    }

    #[test]
    fn test_case_types() {
        let text = "hello wORLD. this is it! \"yes.\" ok";
        assert_eq!(change_case(text, CaseType::Words), "Hello WORLD. This Is It! \"yes.\" Ok");
        assert_eq!(change_case(text, CaseType::WordsFully), "Hello World. This Is It! \"yes.\" Ok");
        assert_eq!(change_case(text, CaseType::Sentences), "Hello wORLD. This is it! \"Yes.\" Ok");
        assert_eq!(change_case(text, CaseType::SentencesFully), "Hello world. This is it! \"Yes.\" Ok");
        assert_eq!(change_case("  mIXED case", CaseType::String), "  MIXED case");
        assert_eq!(change_case("  mIXED case", CaseType::StringFully), "  Mixed case");
        assert_eq!(change_case("Apple Pie", CaseType::Swap), "aPPLE pIE");
    }

    #[test]
    fn test_upper_then_lower_equals_lower_and_swap_is_involution() {
        for x in ["Apple Pie", "MiXeD", "already lower", "ÉCOLE Été"] {
            assert_eq!(
                change_case(&change_case(x, CaseType::Upper), CaseType::Lower),
                change_case(x, CaseType::Lower)
            );
        }
        for x in ["AbCdEf", "abc", "XYZ"] {
            assert_eq!(change_case(&change_case(x, CaseType::Swap), CaseType::Swap), x);
        }
    }

    #[test]
    fn test_apply_to_field_and_both() {
        let tagger = CharacterCaseTagger::new(TextMatcher::basic("title"), CaseType::Upper, ApplyTo::Field);
        let mut doc = doc_with("title", &["Apple Pie"]);
        run(&tagger, &mut doc);
        assert_eq!(doc.metadata.field_names(), vec!["TITLE"]);
        assert_eq!(doc.metadata.first("TITLE"), Some("Apple Pie"));

        let tagger = CharacterCaseTagger::new(TextMatcher::basic("title"), CaseType::Upper, ApplyTo::Both);
        let mut doc = doc_with("title", &["Apple Pie"]);
        run(&tagger, &mut doc);
        assert_eq!(doc.metadata.field_names(), vec!["TITLE"]);
        assert_eq!(doc.metadata.first("TITLE"), Some("APPLE PIE"));
    }

    #[test]
    fn test_missing_or_unsupported_case_type_is_a_no_op() {
        let mut tagger = CharacterCaseTagger::new(TextMatcher::basic("title"), CaseType::Upper, ApplyTo::Value);
        tagger.case_type = None;
        let mut doc = doc_with("title", &["Apple Pie"]);
        run(&tagger, &mut doc);
        assert_eq!(doc.metadata.first("title"), Some("Apple Pie"));

        let yaml = "field_matcher: { pattern: title }\ncase_type: spongebob\n";
        let tagger: CharacterCaseTagger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tagger.case_type, Some(CaseType::Unsupported));
        run(&tagger, &mut doc);
        assert_eq!(doc.metadata.first("title"), Some("Apple Pie"));
    }
}
