use crate::handlers::{read_content, HandlerError, HandlerResult, ImporterHandler, Splitter};
use crate::matcher::Restriction;
use crate::types::{HandlerDoc, SplitDocument};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

const NAME: &str = "CsvSplitter";

fn default_separator() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

/// One child document per CSV row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvSplitter {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    #[serde(default = "default_separator")]
    pub separator: char,
    #[serde(default = "default_quote")]
    pub quote: char,
    #[serde(default)]
    pub use_first_row_as_fields: bool,
    #[serde(default)]
    pub lines_to_skip: usize,
    /// Column giving the child reference, the row number when absent
    #[serde(default)]
    pub reference_column: Option<String>,
    /// Columns making up the child content, all of them when empty
    #[serde(default)]
    pub content_columns: Vec<String>,
}

impl Default for CsvSplitter {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            separator: default_separator(),
            quote: default_quote(),
            use_first_row_as_fields: false,
            lines_to_skip: 0,
            reference_column: None,
            content_columns: Vec::new(),
        }
    }
}

fn ascii_byte(value: char, what: &str) -> HandlerResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| HandlerError::config(NAME, format!("{what} must be an ASCII character")))
}

impl ImporterHandler for CsvSplitter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Splitter for CsvSplitter {
    fn split_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        _output: &mut dyn Write,
    ) -> HandlerResult<Vec<SplitDocument>> {
        let separator = ascii_byte(self.separator, "separator")?;
        let quote = ascii_byte(self.quote, "quote")?;
        let content = read_content(doc, input)?;

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(separator)
            .quote(quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut headers: Option<Vec<String>> = None;
        let mut children = Vec::new();
        let mut row_number = 0;

        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| HandlerError::processing(&doc.reference, format!("bad CSV: {e}")))?;
            if line < self.lines_to_skip {
                continue;
            }
            if self.use_first_row_as_fields && headers.is_none() {
                headers = Some(record.iter().map(|h| h.trim().to_string()).collect());
                continue;
            }
            row_number += 1;

            let columns: Vec<(String, &str)> = record
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let name = headers
                        .as_ref()
                        .and_then(|h| h.get(i))
                        .filter(|h| !h.is_empty())
                        .cloned()
                        .unwrap_or_else(|| format!("field{}", i + 1));
                    (name, value)
                })
                .collect();

            let id = self
                .reference_column
                .as_deref()
                .and_then(|column| {
                    columns
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(column))
                        .map(|(_, value)| value.trim())
                })
                .filter(|value| !value.is_empty())
                .map(String::from)
                .unwrap_or_else(|| row_number.to_string());

            let body: Vec<&str> = columns
                .iter()
                .filter(|(name, _)| {
                    self.content_columns.is_empty()
                        || self.content_columns.iter().any(|c| c.eq_ignore_ascii_case(name))
                })
                .map(|(_, value)| *value)
                .collect();

            let mut child = SplitDocument::new_child(&doc.reference, &id, body.join(" ").into_bytes());
            for (name, value) in &columns {
                if !value.is_empty() {
                    child.metadata.add(name, *value);
                }
            }
            children.push(child);
        }

        debug!(handler = NAME, reference = %doc.reference, children = children.len(), "CSV split");
        Ok(children)
    }
}
