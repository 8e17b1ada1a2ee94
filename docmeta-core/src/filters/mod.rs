//! Filters: handlers that accept or reject a document without changing it.

pub mod empty_metadata;
pub mod numeric_metadata;
pub mod regex_content;
pub mod regex_metadata;

pub use empty_metadata::EmptyMetadataFilter;
pub use numeric_metadata::{NumericCondition, NumericMetadataFilter, Operator};
pub use regex_content::RegexContentFilter;
pub use regex_metadata::RegexMetadataFilter;
