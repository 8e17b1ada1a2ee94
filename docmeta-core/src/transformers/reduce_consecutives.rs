use crate::handlers::{
    default_max_read_size, read_content, write_content, HandlerError, HandlerResult,
    ImporterHandler, Transformer,
};
use crate::matcher::Restriction;
use crate::text;
use crate::types::HandlerDoc;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const NAME: &str = "ReduceConsecutivesTransformer";

/// Collapses repeated runs of the same text into one occurrence.
/// Reductions accept `\n`, `\r`, `\t` and `\s` (space) escapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceConsecutivesTransformer {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub reductions: Vec<String>,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for ReduceConsecutivesTransformer {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            reductions: Vec::new(),
            ignore_case: false,
            max_read_size: default_max_read_size(),
        }
    }
}

impl ReduceConsecutivesTransformer {
    fn patterns(&self) -> HandlerResult<Vec<Regex>> {
        self.reductions
            .iter()
            .map(|r| text::unescape(r))
            .filter(|r| !r.is_empty())
            .map(|r| {
                let escaped = regex::escape(&r);
                RegexBuilder::new(&format!("({escaped})(?:{escaped})+"))
                    .case_insensitive(self.ignore_case)
                    .build()
                    .map_err(|e| HandlerError::config(NAME, e.to_string()))
            })
            .collect()
    }
}

impl ImporterHandler for ReduceConsecutivesTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Transformer for ReduceConsecutivesTransformer {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        let patterns = self.patterns()?;
        let content = read_content(doc, input)?;
        for section in text::text_sections(&content, self.max_read_size) {
            let mut section = section.to_string();
            for pattern in &patterns {
                // keep the first occurrence as written
                section = pattern.replace_all(&section, "${1}").into_owned();
            }
            write_content(doc, output, &section)?;
        }
        Ok(())
    }
}
