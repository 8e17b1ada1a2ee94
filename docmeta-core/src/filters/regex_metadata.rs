use crate::handlers::{field_matcher, value_matcher, Filter, HandlerResult, ImporterHandler, OnMatch};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "RegexMetadataFilter";

/// Matches documents having a field value matched by `value_matcher`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegexMetadataFilter {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
    pub value_matcher: TextMatcher,
    #[serde(default)]
    pub on_match: OnMatch,
}

impl ImporterHandler for RegexMetadataFilter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Filter for RegexMetadataFilter {
    fn on_match(&self) -> OnMatch {
        self.on_match
    }

    fn is_matched(&self, doc: &HandlerDoc, _input: &mut dyn Read) -> HandlerResult<bool> {
        let fields = field_matcher(NAME, &self.field_matcher)?;
        let values = value_matcher(NAME, &self.value_matcher)?;
        Ok(doc.metadata.iter().any(|(name, found)| {
            fields.matches(name) && found.iter().any(|v| values.matches(v))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    #[test]
    fn test_include_and_exclude() {
        let mut metadata = Metadata::new();
        metadata.add("document.contentType", "text/html; charset=utf-8");
        let doc = HandlerDoc::new("doc", metadata, ParseState::Post);

        let mut filter = RegexMetadataFilter {
            field_matcher: TextMatcher::basic("document.contentType"),
            value_matcher: TextMatcher::regex("text/html.*"),
            ..Default::default()
        };
        assert!(filter.accept(&doc, &mut Cursor::new(b"")).unwrap());

        filter.on_match = OnMatch::Exclude;
        assert!(!filter.accept(&doc, &mut Cursor::new(b"")).unwrap());

        filter.value_matcher = TextMatcher::basic("application/pdf");
        assert!(filter.accept(&doc, &mut Cursor::new(b"")).unwrap());
    }
}
