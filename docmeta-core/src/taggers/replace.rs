use crate::handlers::{field_matcher, value_matcher, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "ReplaceTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Replacement {
    pub field_matcher: TextMatcher,
    /// `partial: false` replaces only values matching as a whole
    pub value_matcher: TextMatcher,
    #[serde(default)]
    pub to_value: String,
    #[serde(default)]
    pub to_field: Option<String>,
    #[serde(default)]
    pub replace_all: bool,
    #[serde(default)]
    pub discard_unchanged: bool,
    #[serde(default)]
    pub on_set: PropertySetter,
}

/// Replaces text in field values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplaceTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub replacements: Vec<Replacement>,
}

impl ImporterHandler for ReplaceTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for ReplaceTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        for r in &self.replacements {
            let fields = field_matcher(NAME, &r.field_matcher)?;
            let values = value_matcher(NAME, &r.value_matcher)?;
            let to_field = r.to_field.as_deref().filter(|f| !f.trim().is_empty());

            for field in doc.metadata.matching_fields(&fields) {
                let Some(current) = doc.metadata.get(&field) else {
                    continue;
                };
                let mut replaced = Vec::with_capacity(current.len());
                for value in current {
                    let new_value = values.replace(value, &r.to_value, r.replace_all);
                    if r.discard_unchanged && new_value == *value {
                        continue;
                    }
                    replaced.push(new_value);
                }
                match to_field {
                    Some(to_field) => r.on_set.apply(&mut doc.metadata, to_field, replaced),
                    None => doc.metadata.set(&field, replaced),
                }
            }
        }
        Ok(())
    }
}
