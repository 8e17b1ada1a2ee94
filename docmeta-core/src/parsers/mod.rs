//! Content parsers
//!
//! A parser sits between the pre-parse and post-parse handlers. It turns the
//! raw document bytes into plain text and may add metadata found in the
//! document itself.
//!
//! ```text
//! raw bytes ──▶ [pre-parse handlers] ──▶ ContentParser ──▶ text ──▶ [post-parse handlers]
//! ```
//!
//! ## Available parsers
//!
//! - `PlainTextParser` - passes text through as UTF-8
//! - `XhtmlParser` - text of XHTML/HTML/XML documents, plus `<title>` and `<meta>`

pub mod plain;
pub mod xhtml;

pub use plain::PlainTextParser;
pub use xhtml::XhtmlParser;

use crate::types::{Metadata, DOC_CONTENT_TYPE};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Turns raw content into the text seen by post-parse handlers
pub trait ContentParser: Send + Sync {
    /// Extract the text, adding any embedded metadata to `metadata`
    fn parse(&self, reference: &str, content: &[u8], metadata: &mut Metadata) -> Result<Vec<u8>>;

    /// Parser name for logging and profiling
    fn name(&self) -> &str;

    fn supports_content_type(&self, content_type: &str) -> bool;
}

/// Which parser to use between the two handler phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// XHTML for markup content, plain text otherwise
    #[default]
    Auto,
    Plain,
    Xhtml,
}

impl ParserKind {
    pub fn parser_for(self, content: &[u8], metadata: &Metadata) -> Box<dyn ContentParser> {
        match self {
            ParserKind::Plain => Box::new(PlainTextParser),
            ParserKind::Xhtml => Box::new(XhtmlParser),
            ParserKind::Auto => {
                let xhtml = XhtmlParser;
                let declared = metadata
                    .first(DOC_CONTENT_TYPE)
                    .is_some_and(|ct| xhtml.supports_content_type(ct));
                if declared || looks_like_markup(content) {
                    Box::new(xhtml)
                } else {
                    Box::new(PlainTextParser)
                }
            }
        }
    }
}

fn looks_like_markup(content: &[u8]) -> bool {
    let start = content
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(content.len());
    // skip a UTF-8 byte order mark
    let rest = &content[start..];
    let rest = rest.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(rest);
    rest.first() == Some(&b'<')
}
