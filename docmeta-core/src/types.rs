use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::matcher::CompiledMatcher;

// ===== WELL-KNOWN METADATA KEYS =====

pub const DOC_REFERENCE: &str = "document.reference";
pub const DOC_CONTENT_TYPE: &str = "document.contentType";
pub const DOC_EMBEDDED_REFERENCE: &str = "document.embedded.reference";
pub const DOC_EMBEDDED_PARENT_REFERENCE: &str = "document.embedded.parent.reference";

// ===== METADATA =====

/// Ordered multimap of field name to values.
///
/// Field names compare case-insensitively; the spelling and position of the
/// first insertion are kept. A field is never mapped to an empty list: setting
/// an empty list removes the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    fields: Vec<(String, Vec<String>)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    fn position(&self, field: &str) -> Option<usize> {
        let field = field.to_lowercase();
        self.fields
            .iter()
            .position(|(name, _)| name.to_lowercase() == field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.position(field).map(|i| self.fields[i].1.as_slice())
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First value parsed as an integer, if present and numeric
    pub fn first_int(&self, field: &str) -> Option<i64> {
        self.first(field).and_then(|v| v.trim().parse::<i64>().ok())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// Replace all values of a field. An empty list removes the field.
    pub fn set(&mut self, field: &str, values: Vec<String>) {
        if values.is_empty() {
            self.remove(field);
            return;
        }
        match self.position(field) {
            Some(i) => self.fields[i].1 = values,
            None => self.fields.push((field.to_string(), values)),
        }
    }

    pub fn add(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(field) {
            Some(i) => self.fields[i].1.push(value),
            None => self.fields.push((field.to_string(), vec![value])),
        }
    }

    pub fn add_all(&mut self, field: &str, values: Vec<String>) {
        if values.is_empty() {
            return;
        }
        match self.position(field) {
            Some(i) => self.fields[i].1.extend(values),
            None => self.fields.push((field.to_string(), values)),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<Vec<String>> {
        self.position(field).map(|i| self.fields.remove(i).1)
    }

    /// Rename a field. Renaming to a different spelling of the same name keeps
    /// its position; renaming onto another existing field merges the values.
    pub fn rename(&mut self, from: &str, to: &str) {
        let Some(i) = self.position(from) else {
            return;
        };
        if from.to_lowercase() == to.to_lowercase() {
            self.fields[i].0 = to.to_string();
            return;
        }
        let (_, values) = self.fields.remove(i);
        self.add_all(to, values);
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Field names selected by a matcher, in metadata order.
    /// Computed on every call since handlers add and remove fields as they go.
    pub fn matching_fields(&self, matcher: &CompiledMatcher) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(name, _)| matcher.matches(name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.fields.retain(|(name, _)| keep(name));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, values) in &self.fields {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Accepts either a single string or a list of strings per field
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

struct MetadataVisitor;

impl<'de> Visitor<'de> for MetadataVisitor {
    type Value = Metadata;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of field names to a value or list of values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Metadata, A::Error> {
        let mut metadata = Metadata::new();
        while let Some((name, values)) = access.next_entry::<String, OneOrMany>()? {
            match values {
                OneOrMany::One(value) => metadata.add(&name, value),
                OneOrMany::Many(values) => metadata.add_all(&name, values),
            }
        }
        Ok(metadata)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MetadataVisitor)
    }
}

// ===== DOCUMENT HANDLES =====

/// Whether handlers see raw content or text extracted by a parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseState {
    Pre,
    Post,
}

impl ParseState {
    pub fn is_parsed(self) -> bool {
        self == ParseState::Post
    }
}

/// The document as seen by a handler: everything except the content stream,
/// which is passed separately.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDoc {
    pub reference: String,
    pub metadata: Metadata,
    pub parse_state: ParseState,
}

impl HandlerDoc {
    pub fn new(reference: impl Into<String>, metadata: Metadata, parse_state: ParseState) -> Self {
        Self {
            reference: reference.into(),
            metadata,
            parse_state,
        }
    }
}

/// A document derived from another one by a splitter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitDocument {
    pub reference: String,
    pub metadata: Metadata,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl SplitDocument {
    /// Child with the embedded-reference fields already filled in
    pub fn new_child(parent_reference: &str, child_id: &str, content: Vec<u8>) -> Self {
        let reference = format!("{parent_reference}!{child_id}");
        let mut metadata = Metadata::new();
        metadata.set(DOC_REFERENCE, vec![reference.clone()]);
        metadata.set(DOC_EMBEDDED_REFERENCE, vec![child_id.to_string()]);
        metadata.set(
            DOC_EMBEDDED_PARENT_REFERENCE,
            vec![parent_reference.to_string()],
        );
        Self {
            reference,
            metadata,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_case_insensitive() {
        let mut metadata = Metadata::new();
        metadata.add("Title", "Apple Pie");
        metadata.add("title", "Cherry Pie");

        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.field_names(), vec!["Title".to_string()]);
        assert_eq!(
            metadata.get("TITLE").unwrap(),
            &["Apple Pie".to_string(), "Cherry Pie".to_string()]
        );
    }

    #[test]
    fn test_set_empty_removes_field() {
        let mut metadata = Metadata::new();
        metadata.add("fruit", "apple");
        metadata.set("fruit", Vec::new());
        assert!(!metadata.contains("fruit"));
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut metadata = Metadata::new();
        metadata.add("b", "1");
        metadata.add("a", "2");
        metadata.add("c", "3");
        metadata.set("a", vec!["4".to_string()]);
        assert_eq!(metadata.field_names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rename() {
        let mut metadata = Metadata::new();
        metadata.add("title", "a");
        metadata.add("other", "b");
        metadata.add("target", "c");

        metadata.rename("title", "TITLE");
        assert_eq!(metadata.field_names(), vec!["TITLE", "other", "target"]);

        metadata.rename("other", "target");
        assert_eq!(metadata.field_names(), vec!["TITLE", "target"]);
        assert_eq!(metadata.get("target").unwrap(), &["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let json = r#"{"zeta": "z", "alpha": ["a1", "a2"]}"#;
        let metadata: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.field_names(), vec!["zeta", "alpha"]);
        assert_eq!(metadata.get("alpha").unwrap().len(), 2);

        let out = serde_json::to_string(&metadata).unwrap();
        assert_eq!(out, r#"{"zeta":["z"],"alpha":["a1","a2"]}"#);
    }

    #[test]
    fn test_first_int() {
        let mut metadata = Metadata::new();
        metadata.add("count", " 42 ");
        metadata.add("name", "x");
        assert_eq!(metadata.first_int("count"), Some(42));
        assert_eq!(metadata.first_int("name"), None);
        assert_eq!(metadata.first_int("missing"), None);
    }

    #[test]
    fn test_split_child_reference() {
        let child = SplitDocument::new_child("file.csv", "3", b"row".to_vec());
        assert_eq!(child.reference, "file.csv!3");
        assert_eq!(child.metadata.first(DOC_EMBEDDED_REFERENCE), Some("3"));
        assert_eq!(
            child.metadata.first(DOC_EMBEDDED_PARENT_REFERENCE),
            Some("file.csv")
        );
    }
}
