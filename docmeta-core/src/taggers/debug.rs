use crate::handlers::{field_matcher, read_content, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{debug, error, info, trace, warn};

const NAME: &str = "DebugTagger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Logs metadata and optionally content. Never changes the document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DebugTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    /// Every field when absent
    #[serde(default)]
    pub log_fields: Option<TextMatcher>,
    #[serde(default)]
    pub log_content: bool,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub prefix: String,
}

impl DebugTagger {
    fn log(&self, reference: &str, line: &str) {
        let prefix = self.prefix.as_str();
        match self.log_level {
            LogLevel::Trace => trace!(handler = NAME, reference, "{prefix}{line}"),
            LogLevel::Debug => debug!(handler = NAME, reference, "{prefix}{line}"),
            LogLevel::Info => info!(handler = NAME, reference, "{prefix}{line}"),
            LogLevel::Warn => warn!(handler = NAME, reference, "{prefix}{line}"),
            LogLevel::Error => error!(handler = NAME, reference, "{prefix}{line}"),
        }
    }

    /// Lines that get logged for a document, in order
    pub fn debug_lines(&self, doc: &HandlerDoc, content: Option<&str>) -> HandlerResult<Vec<String>> {
        let matcher = match &self.log_fields {
            Some(fields) => Some(field_matcher(NAME, fields)?),
            None => None,
        };
        let mut lines: Vec<String> = doc
            .metadata
            .iter()
            .filter(|(name, _)| matcher.as_ref().map_or(true, |m| m.matches(name)))
            .map(|(name, values)| format!("{name}={}", values.join(", ")))
            .collect();
        if let Some(content) = content {
            lines.push(format!("CONTENT={content}"));
        }
        Ok(lines)
    }
}

impl ImporterHandler for DebugTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for DebugTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        let content = if self.log_content {
            Some(read_content(doc, input)?)
        } else {
            None
        };
        for line in self.debug_lines(doc, content.as_deref())? {
            self.log(&doc.reference, &line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn doc() -> HandlerDoc {
        let mut metadata = Metadata::new();
        metadata.add_all("fruit", vec!["apple".into(), "pear".into()]);
        metadata.add("color", "red");
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    #[test]
    fn test_lines_for_selected_fields() {
        let tagger = DebugTagger {
            log_fields: Some(TextMatcher::basic("fruit")),
            ..Default::default()
        };
        let lines = tagger.debug_lines(&doc(), Some("body")).unwrap();
        assert_eq!(lines, vec!["fruit=apple, pear", "CONTENT=body"]);
    }

    #[test]
    fn test_tagging_leaves_document_unchanged() {
        let tagger = DebugTagger {
            log_content: true,
            log_level: LogLevel::Warn,
            ..Default::default()
        };
        let mut doc = doc();
        let before = doc.clone();
        tagger.tag(&mut doc, &mut Cursor::new("content")).unwrap();
        assert_eq!(doc, before);
    }
}
