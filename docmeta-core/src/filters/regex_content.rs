use crate::handlers::{
    default_max_read_size, read_content, value_matcher, Filter, HandlerResult, ImporterHandler,
    OnMatch,
};
use crate::matcher::{Restriction, TextMatcher};
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "RegexContentFilter";

/// Matches documents whose content contains `value_matcher`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegexContentFilter {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub value_matcher: TextMatcher,
    #[serde(default)]
    pub on_match: OnMatch,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

impl RegexContentFilter {
    pub fn new(value_matcher: TextMatcher, on_match: OnMatch) -> Self {
        Self {
            restrict_to: Vec::new(),
            value_matcher,
            on_match,
            max_read_size: default_max_read_size(),
        }
    }
}

impl ImporterHandler for RegexContentFilter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Filter for RegexContentFilter {
    fn on_match(&self) -> OnMatch {
        self.on_match
    }

    fn is_matched(&self, doc: &HandlerDoc, input: &mut dyn Read) -> HandlerResult<bool> {
        let matcher = value_matcher(NAME, &self.value_matcher.clone().partial(true))?;
        let content = read_content(doc, input)?;
        Ok(text::text_sections(&content, self.max_read_size)
            .into_iter()
            .any(|section| matcher.matches(section)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    #[test]
    fn test_content_filter() {
        let doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        let filter = RegexContentFilter::new(TextMatcher::regex(r"(?i)\bconfidential\b"), OnMatch::Exclude);
        assert!(!filter
            .accept(&doc, &mut Cursor::new("This memo is CONFIDENTIAL."))
            .unwrap());
        assert!(filter
            .accept(&doc, &mut Cursor::new("Public announcement."))
            .unwrap());
    }
}
