use super::marker_regex;
use crate::handlers::{
    default_max_read_size, read_content, write_content, HandlerResult, ImporterHandler,
    Transformer,
};
use crate::matcher::{Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const NAME: &str = "StripBetweenTransformer";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StripBetween {
    pub start: TextMatcher,
    pub end: TextMatcher,
    /// Remove the markers as well
    #[serde(default)]
    pub inclusive: bool,
}

/// Removes the text found between start and end markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripBetweenTransformer {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub operations: Vec<StripBetween>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for StripBetweenTransformer {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            operations: Vec::new(),
            max_read_size: default_max_read_size(),
        }
    }
}

fn strip_between(text: &str, start: &Regex, end: &Regex, inclusive: bool) -> String {
    let mut result = String::with_capacity(text.len());
    let mut kept_from = 0;
    let mut search_from = 0;
    while let Some(s) = start.find_at(text, search_from) {
        let Some(e) = end.find_at(text, s.end()) else {
            break;
        };
        let (cut_start, cut_end) = if inclusive {
            (s.start(), e.end())
        } else {
            (s.end(), e.start())
        };
        result.push_str(&text[kept_from..cut_start]);
        kept_from = cut_end;
        if e.end() > search_from {
            search_from = e.end();
        } else {
            match text[search_from..].chars().next() {
                Some(ch) => search_from += ch.len_utf8(),
                None => break,
            }
        }
    }
    result.push_str(&text[kept_from..]);
    result
}

impl ImporterHandler for StripBetweenTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Transformer for StripBetweenTransformer {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        let markers = self
            .operations
            .iter()
            .map(|op| -> HandlerResult<(Regex, Regex, bool)> {
                Ok((marker_regex(NAME, &op.start)?, marker_regex(NAME, &op.end)?, op.inclusive))
            })
            .collect::<HandlerResult<Vec<_>>>()?;

        let content = read_content(doc, input)?;
        for section in text::text_sections(&content, self.max_read_size) {
            let mut section = section.to_string();
            for (start, end, inclusive) in &markers {
                section = strip_between(&section, start, end, *inclusive);
            }
            write_content(doc, output, &section)?;
        }
        Ok(())
    }
}
