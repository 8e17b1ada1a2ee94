use crate::handlers::{field_matcher, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::{Restriction, TextMatcher};
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;

const NAME: &str = "TruncateTagger";

/// Hex characters of the tail digest appended to truncated values
const HASH_LENGTH: usize = 8;

/// Clips values longer than a maximum number of characters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TruncateTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
    pub max_length: usize,
    /// Truncates in place when absent
    #[serde(default)]
    pub to_field: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    /// Ends truncated values with a digest of the removed text so that
    /// values sharing a prefix stay distinct
    #[serde(default)]
    pub append_hash: bool,
    #[serde(default)]
    pub on_set: PropertySetter,
}

fn tail_hash(removed: &str) -> String {
    let digest = Sha256::digest(removed.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..HASH_LENGTH].to_string()
}

/// Never returns more than `max_length` characters, suffix and hash included
pub fn truncate(value: &str, max_length: usize, suffix: Option<&str>, append_hash: bool) -> String {
    if value.chars().count() <= max_length {
        return value.to_string();
    }
    let suffix = suffix.unwrap_or("");
    let marker_length = suffix.chars().count() + if append_hash { HASH_LENGTH } else { 0 };
    let keep = max_length.saturating_sub(marker_length);

    let cut = value
        .char_indices()
        .nth(keep)
        .map_or(value.len(), |(i, _)| i);
    let (head, removed) = value.split_at(cut);

    let mut result = String::with_capacity(max_length);
    result.push_str(head);
    result.push_str(suffix);
    if append_hash {
        result.push_str(&tail_hash(removed));
    }
    if marker_length > max_length {
        return result.chars().take(max_length).collect();
    }
    result
}

impl ImporterHandler for TruncateTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for TruncateTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        let matcher = field_matcher(NAME, &self.field_matcher)?;
        let to_field = self.to_field.as_deref().filter(|f| !f.trim().is_empty());

        for field in doc.metadata.matching_fields(&matcher) {
            let Some(values) = doc.metadata.get(&field) else {
                continue;
            };
            let truncated: Vec<String> = values
                .iter()
                .map(|v| truncate(v, self.max_length, self.suffix.as_deref(), self.append_hash))
                .collect();
            match to_field {
                Some(to_field) => self.on_set.apply(&mut doc.metadata, to_field, truncated),
                None => doc.metadata.set(&field, truncated),
            }
        }
        Ok(())
    }
}
