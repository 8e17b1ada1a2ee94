// Docmeta Core Library
//
// Document import pipeline built from pluggable handlers: taggers,
// transformers, splitters and filters run around a content parser.
// Main interface for importing a document into metadata plus text.

pub mod types;
pub mod matcher;
pub mod setter;
pub mod text;
pub mod handlers;
pub mod taggers;
pub mod transformers;
pub mod splitters;
pub mod filters;
pub mod parsers;
pub mod config;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use matcher::{CompiledMatcher, MatchMethod, Restriction, TextMatcher};
pub use setter::PropertySetter;
pub use handlers::{Filter, HandlerError, HandlerResult, ImporterHandler, OnMatch, Splitter, Tagger, Transformer};
pub use parsers::{ContentParser, ParserKind, PlainTextParser, XhtmlParser};
pub use config::{HandlerConfig, HandlerRef, ImporterConfig, AVAILABLE_HANDLERS};
pub use processor::{DocumentImporter, ImportResponse, ImportStatus, StepProfiler};
