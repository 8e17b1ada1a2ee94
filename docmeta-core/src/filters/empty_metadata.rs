use crate::handlers::{field_matcher, Filter, HandlerResult, ImporterHandler, OnMatch};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "EmptyMetadataFilter";

/// Matches documents where the selected fields are missing or blank
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyMetadataFilter {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
    #[serde(default)]
    pub on_match: OnMatch,
}

impl ImporterHandler for EmptyMetadataFilter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Filter for EmptyMetadataFilter {
    fn on_match(&self) -> OnMatch {
        self.on_match
    }

    fn is_matched(&self, doc: &HandlerDoc, _input: &mut dyn Read) -> HandlerResult<bool> {
        let matcher = field_matcher(NAME, &self.field_matcher)?;
        Ok(doc
            .metadata
            .iter()
            .filter(|(name, _)| matcher.matches(name))
            .all(|(_, values)| values.iter().all(|v| v.trim().is_empty())))
    }
}
