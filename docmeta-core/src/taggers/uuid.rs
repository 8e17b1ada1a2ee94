use crate::handlers::{HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;
use uuid::Uuid;

const NAME: &str = "UuidTagger";

pub const DEFAULT_UUID_FIELD: &str = "document.uuid";

fn default_to_field() -> String {
    DEFAULT_UUID_FIELD.to_string()
}

/// Gives each document a random UUID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UuidTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    #[serde(default = "default_to_field")]
    pub to_field: String,
    #[serde(default)]
    pub on_set: PropertySetter,
}

impl Default for UuidTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            to_field: default_to_field(),
            on_set: PropertySetter::default(),
        }
    }
}

impl ImporterHandler for UuidTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for UuidTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        let to_field = if self.to_field.trim().is_empty() {
            DEFAULT_UUID_FIELD
        } else {
            self.to_field.as_str()
        };
        self.on_set
            .apply_one(&mut doc.metadata, to_field, Uuid::new_v4().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    #[test]
    fn test_unique_uuid_per_document() {
        let tagger = UuidTagger::default();
        let mut a = HandlerDoc::new("a", Metadata::new(), ParseState::Post);
        let mut b = HandlerDoc::new("b", Metadata::new(), ParseState::Post);
        tagger.tag(&mut a, &mut Cursor::new(b"")).unwrap();
        tagger.tag(&mut b, &mut Cursor::new(b"")).unwrap();

        let a = a.metadata.first(DEFAULT_UUID_FIELD).unwrap().to_string();
        let b = b.metadata.first(DEFAULT_UUID_FIELD).unwrap();
        assert!(Uuid::parse_str(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_optional_keeps_existing() {
        let tagger = UuidTagger {
            to_field: "id".into(),
            on_set: PropertySetter::Optional,
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.add("id", "fixed");
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.get("id").unwrap(), &["fixed".to_string()]);
    }
}
