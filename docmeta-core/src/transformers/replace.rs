use crate::handlers::{
    default_max_read_size, read_content, value_matcher, write_content, HandlerResult,
    ImporterHandler, Transformer,
};
use crate::matcher::{CompiledMatcher, Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const NAME: &str = "ReplaceTransformer";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentReplacement {
    /// Always searched for, never matched against a whole section
    pub value_matcher: TextMatcher,
    #[serde(default)]
    pub to_value: String,
    #[serde(default)]
    pub replace_all: bool,
}

/// Replaces text in the content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceTransformer {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub replacements: Vec<ContentReplacement>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl Default for ReplaceTransformer {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            replacements: Vec::new(),
            max_read_size: default_max_read_size(),
        }
    }
}

impl ImporterHandler for ReplaceTransformer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Transformer for ReplaceTransformer {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        let matchers = self
            .replacements
            .iter()
            .map(|r| value_matcher(NAME, &r.value_matcher.clone().partial(true)))
            .collect::<HandlerResult<Vec<CompiledMatcher>>>()?;

        let content = read_content(doc, input)?;
        for section in text::text_sections(&content, self.max_read_size) {
            let mut section = section.to_string();
            for (r, matcher) in self.replacements.iter().zip(&matchers) {
                section = matcher.replace(&section, &r.to_value, r.replace_all);
            }
            write_content(doc, output, &section)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn run(transformer: &ReplaceTransformer, content: &str) -> String {
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        let mut output = Vec::new();
        transformer
            .transform(&mut doc, &mut Cursor::new(content), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_replace_in_content() {
        let transformer = ReplaceTransformer {
            replacements: vec![
                ContentReplacement {
                    value_matcher: TextMatcher::basic("apple").ignore_case(true),
                    to_value: "pear".into(),
                    replace_all: true,
                },
                ContentReplacement {
                    value_matcher: TextMatcher::regex(r"(\d+) kg"),
                    to_value: "${1}kg".into(),
                    replace_all: false,
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            run(&transformer, "Apple 2 kg, apple 3 kg"),
            "pear 2kg, pear 3 kg"
        );
    }
}
