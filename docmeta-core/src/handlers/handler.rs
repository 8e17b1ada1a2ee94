// Handler contract shared by taggers, transformers, splitters and filters
//
// Each variant trait exposes a template method (`tag`, `transform`, `split`,
// `accept`) that checks the handler restrictions first and only then calls the
// variant-specific hook.

use crate::matcher::{restrictions_match, CompiledMatcher, Restriction, TextMatcher};
use crate::text;
use crate::types::{HandlerDoc, SplitDocument};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Blank required parameter or a pattern that does not compile.
    /// The handler had no effect on the document.
    #[error("invalid {handler} configuration: {message}")]
    InvalidConfig {
        handler: &'static str,
        message: String,
    },
    #[error("I/O failure while handling \"{reference}\": {source}")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not handle \"{reference}\": {message}")]
    Processing { reference: String, message: String },
}

impl HandlerError {
    pub fn config(handler: &'static str, message: impl Into<String>) -> Self {
        HandlerError::InvalidConfig {
            handler,
            message: message.into(),
        }
    }

    pub fn io(reference: &str, source: std::io::Error) -> Self {
        HandlerError::Io {
            reference: reference.to_string(),
            source,
        }
    }

    pub fn processing(reference: &str, message: impl Into<String>) -> Self {
        HandlerError::Processing {
            reference: reference.to_string(),
            message: message.into(),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Compile a field-name matcher, reporting a bad pattern as a config error
pub fn field_matcher(handler: &'static str, matcher: &TextMatcher) -> HandlerResult<CompiledMatcher> {
    matcher
        .compile_for_fields()
        .map_err(|e| HandlerError::config(handler, format!("bad field pattern: {e}")))
}

/// Compile a value matcher, reporting a bad pattern as a config error
pub fn value_matcher(handler: &'static str, matcher: &TextMatcher) -> HandlerResult<CompiledMatcher> {
    matcher
        .compile_for_values()
        .map_err(|e| HandlerError::config(handler, format!("bad value pattern: {e}")))
}

/// Read the whole content stream as text
pub fn read_content(doc: &HandlerDoc, input: &mut dyn Read) -> HandlerResult<String> {
    text::read_text(input).map_err(|e| HandlerError::io(&doc.reference, e))
}

pub fn write_content(doc: &HandlerDoc, output: &mut dyn Write, content: &str) -> HandlerResult<()> {
    output
        .write_all(content.as_bytes())
        .map_err(|e| HandlerError::io(&doc.reference, e))
}

fn copy_through(doc: &HandlerDoc, input: &mut dyn Read, output: &mut dyn Write) -> HandlerResult<()> {
    std::io::copy(input, output)
        .map(|_| ())
        .map_err(|e| HandlerError::io(&doc.reference, e))
}

/// What every handler has in common
pub trait ImporterHandler: Send + Sync {
    /// Handler name for logging and error context
    fn name(&self) -> &'static str;

    fn restrictions(&self) -> &[Restriction];

    /// Settings errors that do not depend on the document. Run at config
    /// load and before a handler touches the document.
    fn validate(&self) -> HandlerResult<()> {
        Ok(())
    }

    fn is_applicable(&self, doc: &HandlerDoc) -> HandlerResult<bool> {
        restrictions_match(self.restrictions(), &doc.metadata)
            .map_err(|e| HandlerError::config(self.name(), format!("bad restriction: {e}")))
    }
}

pub trait Tagger: ImporterHandler {
    fn tag_applicable(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()>;

    fn tag(&self, doc: &mut HandlerDoc, input: &mut dyn Read) -> HandlerResult<()> {
        if !self.is_applicable(doc)? {
            debug!(handler = self.name(), reference = %doc.reference, "tagger not applicable");
            return Ok(());
        }
        self.tag_applicable(doc, input)
    }
}

pub trait Transformer: ImporterHandler {
    fn transform_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()>;

    /// Not applicable means the content is copied through unchanged
    fn transform(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<()> {
        if !self.is_applicable(doc)? {
            debug!(handler = self.name(), reference = %doc.reference, "transformer not applicable");
            return copy_through(doc, input, output);
        }
        self.transform_applicable(doc, input, output)
    }
}

pub trait Splitter: ImporterHandler {
    fn split_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<Vec<SplitDocument>>;

    /// Returns the child documents. Whatever is written to `output` becomes
    /// the parent content.
    fn split(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> HandlerResult<Vec<SplitDocument>> {
        if !self.is_applicable(doc)? {
            debug!(handler = self.name(), reference = %doc.reference, "splitter not applicable");
            copy_through(doc, input, output)?;
            return Ok(Vec::new());
        }
        self.split_applicable(doc, input, output)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMatch {
    #[default]
    Include,
    Exclude,
}

pub trait Filter: ImporterHandler {
    fn on_match(&self) -> OnMatch;

    fn is_matched(&self, doc: &HandlerDoc, input: &mut dyn Read) -> HandlerResult<bool>;

    /// Documents a filter does not apply to are accepted
    fn accept(&self, doc: &HandlerDoc, input: &mut dyn Read) -> HandlerResult<bool> {
        if !self.is_applicable(doc)? {
            debug!(handler = self.name(), reference = %doc.reference, "filter not applicable");
            return Ok(true);
        }
        let matched = self.is_matched(doc, input)?;
        Ok(match self.on_match() {
            OnMatch::Include => matched,
            OnMatch::Exclude => !matched,
        })
    }
}

// Serde default helpers shared by the handler configurations
pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_max_read_size() -> usize {
    text::DEFAULT_MAX_READ_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    struct Marker {
        restrict_to: Vec<Restriction>,
    }

    impl ImporterHandler for Marker {
        fn name(&self) -> &'static str {
            "Marker"
        }

        fn restrictions(&self) -> &[Restriction] {
            &self.restrict_to
        }
    }

    impl Tagger for Marker {
        fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
            doc.metadata.add("tagged", "yes");
            Ok(())
        }
    }

    impl Transformer for Marker {
        fn transform_applicable(
            &self,
            doc: &mut HandlerDoc,
            input: &mut dyn Read,
            output: &mut dyn Write,
        ) -> HandlerResult<()> {
            let content = read_content(doc, input)?;
            write_content(doc, output, &content.to_uppercase())
        }
    }

    fn html_only() -> Marker {
        Marker {
            restrict_to: vec![Restriction::new(
                TextMatcher::basic("document.contentType"),
                TextMatcher::basic("text/html"),
            )],
        }
    }

    fn doc(content_type: &str) -> HandlerDoc {
        let mut metadata = Metadata::new();
        metadata.add("document.contentType", content_type);
        HandlerDoc::new("doc1", metadata, ParseState::Post)
    }

    #[test]
    fn test_tagger_skipped_when_not_applicable() {
        let mut plain = doc("text/plain");
        html_only().tag(&mut plain, &mut Cursor::new(b"")).unwrap();
        assert!(!plain.metadata.contains("tagged"));

        let mut html = doc("text/html");
        html_only().tag(&mut html, &mut Cursor::new(b"")).unwrap();
        assert_eq!(html.metadata.first("tagged"), Some("yes"));
    }

    #[test]
    fn test_transformer_copies_content_when_not_applicable() {
        let mut plain = doc("text/plain");
        let mut output = Vec::new();
        html_only()
            .transform(&mut plain, &mut Cursor::new(b"abc"), &mut output)
            .unwrap();
        assert_eq!(output, b"abc");

        let mut html = doc("text/html");
        let mut output = Vec::new();
        html_only()
            .transform(&mut html, &mut Cursor::new(b"abc"), &mut output)
            .unwrap();
        assert_eq!(output, b"ABC");
    }

    #[test]
    fn test_bad_restriction_is_config_error() {
        let marker = Marker {
            restrict_to: vec![Restriction::new(
                TextMatcher::regex("(broken"),
                TextMatcher::basic("x"),
            )],
        };
        let err = marker.is_applicable(&doc("text/html")).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidConfig { .. }));
    }
}
