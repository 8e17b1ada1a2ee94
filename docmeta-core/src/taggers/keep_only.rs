use crate::handlers::{field_matcher, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "KeepOnlyTagger";

/// Deletes every field not matched. A blank matcher keeps nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeepOnlyTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    #[serde(default)]
    pub field_matcher: TextMatcher,
}

impl ImporterHandler for KeepOnlyTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for KeepOnlyTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        let matcher = field_matcher(NAME, &self.field_matcher)?;
        doc.metadata.retain(|field| matcher.matches(field));
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
        metadata.add("title", "Apple");
        metadata.add("author", "Jo");
        metadata.add("x-junk", "1");
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    #[test]
    fn test_keep_only_listed_fields() {
        let tagger = KeepOnlyTagger {
            field_matcher: TextMatcher::csv("Title, author"),
            ..Default::default()
        };
        let mut doc = doc();
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.field_names(), vec!["title", "author"]);
    }

    #[test]
    fn test_blank_matcher_deletes_everything() {
        let mut doc = doc();
        KeepOnlyTagger::default()
            .tag(&mut doc, &mut Cursor::new(b""))
            .unwrap();
        assert!(doc.metadata.is_empty());
    }
}
