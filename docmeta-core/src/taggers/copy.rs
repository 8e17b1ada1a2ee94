use crate::handlers::{field_matcher, HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "CopyTagger";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyOperation {
    pub from_field: TextMatcher,
    pub to_field: String,
    #[serde(default)]
    pub on_set: PropertySetter,
}

/// Copies the values of matching fields into another field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CopyTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub operations: Vec<CopyOperation>,
}

impl ImporterHandler for CopyTagger {
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
            field_matcher(NAME, &op.from_field)?;
        }
        Ok(())
    }
}

impl Tagger for CopyTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        self.validate()?;
        for op in &self.operations {
            let matcher = field_matcher(NAME, &op.from_field)?;
            let values: Vec<String> = doc
                .metadata
                .matching_fields(&matcher)
                .iter()
                .filter_map(|field| doc.metadata.get(field))
                .flat_map(|values| values.iter().cloned())
                .collect();
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
        metadata.add("dc:title", "Apple");
        metadata.add("og:title", "Apple Pie");
        metadata.add("title", "existing");
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    #[test]
    fn test_copy_from_regex_keeps_sources() {
        let tagger = CopyTagger {
            operations: vec![CopyOperation {
                from_field: TextMatcher::regex(".*:title"),
                to_field: "title".into(),
                on_set: PropertySetter::Replace,
            }],
            ..Default::default()
        };
        let mut doc = doc();
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();

        assert_eq!(
            doc.metadata.get("title").unwrap(),
            &["Apple".to_string(), "Apple Pie".to_string()]
        );
        assert!(doc.metadata.contains("dc:title"));
        assert!(doc.metadata.contains("og:title"));
    }

    #[test]
    fn test_blank_target_is_a_config_error() {
        let copy = |to_field: &str| CopyOperation {
            from_field: TextMatcher::basic("title"),
            to_field: to_field.into(),
            on_set: PropertySetter::Append,
        };
        let tagger = CopyTagger {
            operations: vec![copy("copy"), copy("")],
            ..Default::default()
        };
        let mut doc = doc();
        let err = tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidConfig { .. }));
        // the valid first operation did not run either
        assert!(!doc.metadata.contains("copy"));
    }
}
