use crate::types::Metadata;
use serde::{Deserialize, Serialize};

/// How a computed value is merged into a field that may already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertySetter {
    /// Add after existing values
    #[default]
    Append,
    /// Add before existing values
    Prepend,
    /// Discard existing values
    Replace,
    /// Only set when the field does not exist yet
    Optional,
}

impl PropertySetter {
    pub fn apply(self, metadata: &mut Metadata, field: &str, values: Vec<String>) {
        match self {
            PropertySetter::Append => metadata.add_all(field, values),
            PropertySetter::Prepend => {
                if values.is_empty() {
                    return;
                }
                let mut merged = values;
                if let Some(existing) = metadata.get(field) {
                    merged.extend_from_slice(existing);
                }
                metadata.set(field, merged);
            }
            PropertySetter::Replace => metadata.set(field, values),
            PropertySetter::Optional => {
                if !metadata.contains(field) {
                    metadata.set(field, values);
                }
            }
        }
    }

    pub fn apply_one(self, metadata: &mut Metadata, field: &str, value: impl Into<String>) {
        self.apply(metadata, field, vec![value.into()]);
    }
}
