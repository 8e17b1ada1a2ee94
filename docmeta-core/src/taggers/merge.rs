use crate::handlers::{field_matcher, HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "MergeTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergeOperation {
    /// Fields merged first, in this order
    #[serde(default)]
    pub from_fields: Vec<String>,
    /// Fields merged next, in metadata order
    #[serde(default)]
    pub from_fields_regex: Option<TextMatcher>,
    pub to_field: String,
    #[serde(default)]
    pub delete_from_fields: bool,
    #[serde(default)]
    pub single_value: bool,
    #[serde(default)]
    pub single_value_separator: String,
    #[serde(default)]
    pub on_set: PropertySetter,
}

/// Merges the values of several fields into one
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergeTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub operations: Vec<MergeOperation>,
}

impl MergeOperation {
    fn source_fields(&self, doc: &HandlerDoc) -> HandlerResult<Vec<String>> {
        let mut fields: Vec<String> = Vec::new();
        let mut push = |field: &str| {
            if !fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
                fields.push(field.to_string());
            }
        };
        for field in &self.from_fields {
            if !field.trim().is_empty() {
                push(field.trim());
            }
        }
        if let Some(regex) = &self.from_fields_regex {
            let matcher = field_matcher(NAME, regex)?;
            for field in doc.metadata.matching_fields(&matcher) {
                push(&field);
            }
        }
        Ok(fields)
    }
}

impl ImporterHandler for MergeTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }

    fn validate(&self) -> HandlerResult<()> {
        for op in &self.operations {
            if op.to_field.trim().is_empty() {
                return Err(HandlerError::config(NAME, "to_field cannot be blank"));
            }
            if let Some(regex) = &op.from_fields_regex {
                field_matcher(NAME, regex)?;
            }
        }
        Ok(())
    }
}

impl Tagger for MergeTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        self.validate()?;
        for op in &self.operations {
            let fields = op.source_fields(doc)?;

            let mut values: Vec<String> = Vec::new();
            for field in &fields {
                if let Some(found) = doc.metadata.get(field) {
                    values.extend_from_slice(found);
                }
            }
            if op.delete_from_fields {
                for field in &fields {
                    doc.metadata.remove(field);
                }
            }
            if op.single_value && !values.is_empty() {
                values = vec![values.join(&op.single_value_separator)];
            }
            op.on_set.apply(&mut doc.metadata, &op.to_field, values);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn doc() -> HandlerDoc {
        let mut metadata = Metadata::new();
        metadata.add("b", "b1");
        metadata.add("x:1", "x1");
        metadata.add("a", "a1");
        metadata.add("a", "a2");
        metadata.add("x:2", "x2");
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    #[test]
    fn test_literal_fields_then_regex_fields() {
        let tagger = MergeTagger {
            operations: vec![MergeOperation {
                from_fields: vec!["a".into(), "b".into()],
                from_fields_regex: Some(TextMatcher::regex("x:.*")),
                to_field: "merged".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut doc = doc();
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(
            doc.metadata.get("merged").unwrap(),
            &["a1", "a2", "b1", "x1", "x2"].map(String::from)
        );
        assert!(doc.metadata.contains("a"));
    }

    #[test]
    fn test_single_value_and_delete() {
        let tagger = MergeTagger {
            operations: vec![MergeOperation {
                from_fields: vec!["a".into(), "A".into(), "b".into()],
                to_field: "merged".into(),
                delete_from_fields: true,
                single_value: true,
                single_value_separator: "|".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut doc = doc();
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.first("merged"), Some("a1|a2|b1"));
        assert!(!doc.metadata.contains("a"));
        assert!(!doc.metadata.contains("b"));
        assert!(doc.metadata.contains("x:1"));
    }

    #[test]
    fn test_merging_into_a_source_field() {
        let tagger = MergeTagger {
            operations: vec![MergeOperation {
                from_fields: vec!["a".into(), "b".into()],
                to_field: "a".into(),
                delete_from_fields: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut doc = doc();
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.get("a").unwrap(), &["a1", "a2", "b1"].map(String::from));
    }

    #[test]
    fn test_blank_target_is_a_config_error() {
        let tagger = MergeTagger {
            operations: vec![
                MergeOperation {
                    from_fields: vec!["a".into(), "b".into()],
                    to_field: "merged".into(),
                    delete_from_fields: true,
                    ..Default::default()
                },
                MergeOperation {
                    from_fields: vec!["a".into()],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut doc = doc();
        let err = tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidConfig { .. }));
        assert!(!doc.metadata.contains("merged"));
        assert!(doc.metadata.contains("a"));
        assert!(doc.metadata.contains("b"));
    }
}
