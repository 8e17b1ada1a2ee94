use crate::handlers::{field_matcher, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::warn;

const NAME: &str = "RenameTagger";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameOperation {
    pub from_field: TextMatcher,
    pub to_field: String,
    #[serde(default)]
    pub on_set: PropertySetter,
}

/// Moves the values of matching fields under a new name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenameTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub operations: Vec<RenameOperation>,
}

impl ImporterHandler for RenameTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for RenameTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        for op in &self.operations {
            if op.to_field.trim().is_empty() {
                warn!(handler = NAME, reference = %doc.reference, "rename without a target field skipped");
                continue;
            }
            let matcher = field_matcher(NAME, &op.from_field)?;
            let target = op.to_field.to_lowercase();
            let mut values = Vec::new();
            for field in doc.metadata.matching_fields(&matcher) {
                if field.to_lowercase() == target {
                    continue;
                }
                if let Some(removed) = doc.metadata.remove(&field) {
                    values.extend(removed);
                }
            }
            op.on_set.apply(&mut doc.metadata, &op.to_field, values);
        }
        Ok(())
    }
}
