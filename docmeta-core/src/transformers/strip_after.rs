use super::marker_regex;
use crate::handlers::{
    default_max_read_size, read_content, write_content, HandlerResult, ImporterHandler,
    Transformer,
};
use crate::matcher::{Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const NAME: &str = "StripAfterTransformer";

/// Removes everything after the first match of a marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripAfterTransformer {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub matcher: TextMatcher,
    /// Remove the marker as well
    #[serde(default)]
    pub inclusive: bool,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl StripAfterTransformer {
    pub fn new(matcher: TextMatcher, inclusive: bool) -> Self {
        Self {
            restrict_to: Vec::new(),
            matcher,
            inclusive,
            max_read_size: default_max_read_size(),
        }
    }
}

impl ImporterHandler for StripAfterTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Transformer for StripAfterTransformer {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        let marker = marker_regex(NAME, &self.matcher)?;
        let content = read_content(doc, input)?;
        for section in text::text_sections(&content, self.max_read_size) {
            match marker.find(section) {
                Some(m) => {
                    let end = if self.inclusive { m.start() } else { m.end() };
                    // later sections are dropped
                    return write_content(doc, output, &section[..end]);
                }
                None => write_content(doc, output, section)?,
            }
        }
        Ok(())
    }
}
