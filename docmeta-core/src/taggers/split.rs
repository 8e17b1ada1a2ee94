use crate::handlers::{field_matcher, HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::warn;

const NAME: &str = "SplitTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitOperation {
    pub from_field: TextMatcher,
    /// Splits in place when absent
    #[serde(default)]
    pub to_field: Option<String>,
    pub separator: String,
    #[serde(default)]
    pub separator_regex: bool,
    #[serde(default)]
    pub on_set: PropertySetter,
}

/// Splits field values on a separator into multiple values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub operations: Vec<SplitOperation>,
}

impl ImporterHandler for SplitTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }

    fn validate(&self) -> HandlerResult<()> {
        for op in self.operations.iter().filter(|op| op.separator_regex && !op.separator.is_empty()) {
            Regex::new(&op.separator).map_err(|e| HandlerError::config(NAME, format!("bad separator: {e}")))?;
        }
        Ok(())
    }
}

impl Tagger for SplitTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        for op in &self.operations {
            if op.separator.is_empty() {
                warn!(handler = NAME, reference = %doc.reference, "split without a separator skipped");
                continue;
            }
            let regex = if op.separator_regex {
                Some(
                    Regex::new(&op.separator)
                        .map_err(|e| HandlerError::config(NAME, format!("bad separator: {e}")))?,
                )
            } else {
                None
            };
            let matcher = field_matcher(NAME, &op.from_field)?;

            for field in doc.metadata.matching_fields(&matcher) {
                let Some(values) = doc.metadata.get(&field) else {
                    continue;
                };
                let mut segments: Vec<String> = Vec::new();
                for value in values {
                    let parts: Vec<&str> = match &regex {
                        Some(regex) => regex.split(value).collect(),
                        None => value.split(op.separator.as_str()).collect(),
                    };
                    for part in parts {
                        if !part.is_empty() && !segments.iter().any(|s| s == part) {
                            segments.push(part.to_string());
                        }
                    }
                }
                match op.to_field.as_deref().filter(|f| !f.trim().is_empty()) {
                    Some(to_field) => op.on_set.apply(&mut doc.metadata, to_field, segments),
                    None => doc.metadata.set(&field, segments),
                }
            }
        }
        Ok(())
    }
}
