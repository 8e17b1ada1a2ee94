use crate::handlers::{read_content, write_content, HandlerError, HandlerResult, ImporterHandler, Transformer};
use crate::matcher::Restriction;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const NAME: &str = "SubstringTransformer";

/// Keeps the characters from `begin` (inclusive) to `end` (exclusive)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubstringTransformer {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    #[serde(default)]
    pub begin: usize,
    /// Up to the end of the content when absent
    #[serde(default)]
    pub end: Option<usize>,
}

impl ImporterHandler for SubstringTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Transformer for SubstringTransformer {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        if let Some(end) = self.end {
            if end < self.begin {
                return Err(HandlerError::config(
                    NAME,
                    format!("end ({end}) cannot be lower than begin ({})", self.begin),
                ));
            }
        }
        let content = read_content(doc, input)?;
        let kept: String = match self.end {
            Some(end) => content.chars().skip(self.begin).take(end - self.begin).collect(),
            None => content.chars().skip(self.begin).collect(),
        };
        write_content(doc, output, &kept)
    }
}
