//! Transformers: handlers that rewrite document content.
//!
//! Content is read as text and handled in sections of at most
//! `max_read_size` characters; the transformed sections are written out in
//! order.

pub mod reduce_consecutives;
pub mod replace;
pub mod strip_after;
pub mod strip_before;
pub mod strip_between;
pub mod substring;

pub use reduce_consecutives::ReduceConsecutivesTransformer;
pub use replace::{ContentReplacement, ReplaceTransformer};
pub use strip_after::StripAfterTransformer;
pub use strip_before::StripBeforeTransformer;
pub use strip_between::{StripBetween, StripBetweenTransformer};
pub use substring::SubstringTransformer;

use crate::handlers::{value_matcher, HandlerError, HandlerResult};
use crate::matcher::TextMatcher;
use regex::Regex;

/// Unanchored regex for a marker, which must not be blank
pub(crate) fn marker_regex(handler: &'static str, marker: &TextMatcher) -> HandlerResult<Regex> {
    let compiled = value_matcher(handler, &marker.clone().partial(true))?;
    compiled
        .search_regex()
        .cloned()
        .ok_or_else(|| HandlerError::config(handler, "marker pattern cannot be blank"))
}
