use crate::handlers::{field_matcher, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "ForceSingleValueTagger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleValueAction {
    #[default]
    KeepFirst,
    KeepLast,
    Merge,
}

/// Reduces multi-valued fields to a single value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceSingleValueTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
    #[serde(default)]
    pub action: SingleValueAction,
    /// Used by `merge`
    #[serde(default)]
    pub separator: String,
}

impl ImporterHandler for ForceSingleValueTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for ForceSingleValueTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        let matcher = field_matcher(NAME, &self.field_matcher)?;
        for field in doc.metadata.matching_fields(&matcher) {
            let Some(values) = doc.metadata.get(&field) else {
                continue;
            };
            if values.len() < 2 {
                continue;
            }
            let single = match self.action {
                SingleValueAction::KeepFirst => values[0].clone(),
                SingleValueAction::KeepLast => values[values.len() - 1].clone(),
                SingleValueAction::Merge => values.join(&self.separator),
            };
            doc.metadata.set(&field, vec![single]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn run(action: SingleValueAction) -> Option<String> {
        let tagger = ForceSingleValueTagger {
            field_matcher: TextMatcher::basic("fruit"),
            action,
            separator: "+".into(),
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.add_all("fruit", vec!["apple".into(), "pear".into(), "kiwi".into()]);
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.get("fruit").unwrap().len(), 1);
        doc.metadata.first("fruit").map(String::from)
    }

    #[test]
    fn test_actions() {
        assert_eq!(run(SingleValueAction::KeepFirst).as_deref(), Some("apple"));
        assert_eq!(run(SingleValueAction::KeepLast).as_deref(), Some("kiwi"));
        assert_eq!(run(SingleValueAction::Merge).as_deref(), Some("apple+pear+kiwi"));
    }
}
