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
use tracing::debug;

const NAME: &str = "StripBeforeTransformer";

/// Removes everything before the first match of a marker.
/// Content without the marker is left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripBeforeTransformer {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub matcher: TextMatcher,
    /// Remove the marker as well
    #[serde(default)]
    pub inclusive: bool,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl StripBeforeTransformer {
    pub fn new(matcher: TextMatcher, inclusive: bool) -> Self {
        Self {
            restrict_to: Vec::new(),
            matcher,
            inclusive,
            max_read_size: default_max_read_size(),
        }
    }
}

impl ImporterHandler for StripBeforeTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Transformer for StripBeforeTransformer {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        let marker = marker_regex(NAME, &self.matcher)?;
        let content = read_content(doc, input)?;
        let sections = text::text_sections(&content, self.max_read_size);

        let found = sections
            .iter()
            .enumerate()
            .find_map(|(i, section)| marker.find(section).map(|m| (i, m.start(), m.end())));
        let Some((index, start, end)) = found else {
            debug!(handler = NAME, reference = %doc.reference, "marker not found, content kept");
            return write_content(doc, output, &content);
        };

        let from = if self.inclusive { end } else { start };
        write_content(doc, output, &sections[index][from..])?;
        for section in &sections[index + 1..] {
            write_content(doc, output, section)?;
        }
        Ok(())
    }
}
