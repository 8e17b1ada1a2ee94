use crate::handlers::{field_matcher, HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::debug;

const NAME: &str = "DeleteTagger";

/// Deletes matching fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
}

impl ImporterHandler for DeleteTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for DeleteTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        if self.field_matcher.is_blank() {
            return Err(HandlerError::config(NAME, "field_matcher cannot be blank"));
        }
        let matcher = field_matcher(NAME, &self.field_matcher)?;
        for field in doc.metadata.matching_fields(&matcher) {
            debug!(handler = NAME, reference = %doc.reference, field = %field, "deleting field");
            doc.metadata.remove(&field);
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
        metadata.add("X-Powered-By", "php");
        metadata.add("x-frame-options", "deny");
        metadata.add("title", "Apple");
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    #[test]
    fn test_delete_matching() {
        let tagger = DeleteTagger {
            field_matcher: TextMatcher::regex("x-.*").ignore_case(true),
            ..Default::default()
        };
        let mut doc = doc();
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.field_names(), vec!["title"]);
    }

    #[test]
    fn test_blank_matcher_is_a_config_error() {
        let err = DeleteTagger::default()
            .tag(&mut doc(), &mut Cursor::new(b""))
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidConfig { .. }));
    }
}
