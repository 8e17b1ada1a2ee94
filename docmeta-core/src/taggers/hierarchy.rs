use crate::handlers::{HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::warn;

const NAME: &str = "HierarchyTagger";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HierarchyOperation {
    pub from_field: String,
    /// Expands in place when absent
    #[serde(default)]
    pub to_field: Option<String>,
    pub from_separator: String,
    /// Separator written in the expanded values, the original one when absent
    #[serde(default)]
    pub to_separator: Option<String>,
    /// `from_separator` is a regular expression
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub keep_empty_segments: bool,
    #[serde(default)]
    pub on_set: PropertySetter,
}

/// Expands path-like values into every ancestor path:
/// `/a/b/c` becomes `/a`, `/a/b` and `/a/b/c`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HierarchyTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub operations: Vec<HierarchyOperation>,
}

impl HierarchyOperation {
    /// Segments of `value` and the separator text found after each but the last
    fn segments<'a>(&self, value: &'a str, regex: Option<&Regex>) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut segments = Vec::new();
        let mut separators = Vec::new();
        let mut start = 0;
        let found: Vec<(usize, usize)> = match regex {
            Some(regex) => regex
                .find_iter(value)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
            None => value
                .match_indices(self.from_separator.as_str())
                .map(|(i, s)| (i, i + s.len()))
                .collect(),
        };
        for (begin, end) in found {
            segments.push(&value[start..begin]);
            separators.push(&value[begin..end]);
            start = end;
        }
        segments.push(&value[start..]);
        (segments, separators)
    }

    pub fn expand(&self, value: &str, regex: Option<&Regex>) -> Vec<String> {
        let (segments, separators) = self.segments(value, regex);
        let mut path = String::new();
        let mut paths: Vec<String> = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() && (i == 0 || !self.keep_empty_segments) {
                continue;
            }
            if i > 0 {
                let separator = self.to_separator.as_deref().unwrap_or(separators[i - 1]);
                path.push_str(separator);
            }
            path.push_str(segment);
            if !paths.contains(&path) {
                paths.push(path.clone());
            }
        }
        paths
    }
}

impl ImporterHandler for HierarchyTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }

    fn validate(&self) -> HandlerResult<()> {
        for op in self.operations.iter().filter(|op| op.regex && !op.from_separator.is_empty()) {
            Regex::new(&op.from_separator)
                .map_err(|e| HandlerError::config(NAME, format!("bad separator: {e}")))?;
        }
        Ok(())
    }
}

impl Tagger for HierarchyTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        for op in &self.operations {
            if op.from_separator.is_empty() {
                warn!(handler = NAME, reference = %doc.reference, field = %op.from_field, "no separator, hierarchy skipped");
                continue;
            }
            let regex = if op.regex {
                Some(
                    Regex::new(&op.from_separator)
                        .map_err(|e| HandlerError::config(NAME, format!("bad separator: {e}")))?,
                )
            } else {
                None
            };
            let Some(values) = doc.metadata.get(&op.from_field) else {
                continue;
            };

            let mut expanded: Vec<String> = Vec::new();
            for value in values {
                for path in op.expand(value, regex.as_ref()) {
                    if !expanded.contains(&path) {
                        expanded.push(path);
                    }
                }
            }
            match op.to_field.as_deref().filter(|f| !f.trim().is_empty()) {
                Some(to_field) => op.on_set.apply(&mut doc.metadata, to_field, expanded),
                None => doc.metadata.set(&op.from_field, expanded),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;

    fn op(separator: &str) -> HierarchyOperation {
        HierarchyOperation {
            from_field: "path".into(),
            from_separator: separator.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_prefix_expansion() {
        assert_eq!(op("/").expand("/a/b/c", None), vec!["/a", "/a/b", "/a/b/c"]);
        assert_eq!(op("/").expand("a/b", None), vec!["a", "a/b"]);
    }

    #[test]
    fn test_vegetable_in_place() {
        let tagger = HierarchyTagger {
            operations: vec![HierarchyOperation {
                from_field: "vegetable".into(),
                ..op("/")
            }],
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.add("vegetable", "/vegetable/potato/sweet");
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(
            doc.metadata.get("vegetable").unwrap(),
            &["/vegetable", "/vegetable/potato", "/vegetable/potato/sweet"].map(String::from)
        );
    }

    #[test]
    fn test_empty_segments_collapse_or_stay() {
        assert_eq!(op("/").expand("//a//b/", None), vec!["/a", "/a/b"]);

        let mut keep = op("/");
        keep.keep_empty_segments = true;
        assert_eq!(
            keep.expand("/a//b/", None),
            vec!["/a", "/a/", "/a//b", "/a//b/"]
        );
    }

    #[test]
    fn test_regex_separator_and_replacement() {
        let mut op = op(r"\s*>\s*");
        op.regex = true;
        op.to_separator = Some("/".into());
        let regex = Regex::new(&op.from_separator).unwrap();
        assert_eq!(
            op.expand("Food > Fruit >Apple", Some(&regex)),
            vec!["Food", "Food/Fruit", "Food/Fruit/Apple"]
        );
    }

    #[test]
    fn test_to_field_and_blank_separator() {
        let tagger = HierarchyTagger {
            operations: vec![
                HierarchyOperation {
                    to_field: Some("tree".into()),
                    ..op("::")
                },
                HierarchyOperation {
                    to_field: Some("ignored".into()),
                    ..op("")
                },
            ],
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.add_all("path", vec!["a::b".into(), "a::c".into()]);
        let mut doc = HandlerDoc::new("doc", metadata, ParseState::Post);
        tagger.tag(&mut doc, &mut Cursor::new(b"")).unwrap();
        assert_eq!(doc.metadata.get("tree").unwrap(), &["a", "a::b", "a::c"].map(String::from));
        assert!(!doc.metadata.contains("ignored"));
        assert_eq!(doc.metadata.get("path").unwrap().len(), 2);
    }
}
