use crate::handlers::{read_content, HandlerError, HandlerResult, ImporterHandler, Splitter};
use crate::matcher::Restriction;
use crate::types::{HandlerDoc, SplitDocument};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

const NAME: &str = "XmlStreamSplitter";

/// One child document per element found at `path`, e.g. `/catalog/book`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XmlStreamSplitter {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub path: String,
}

impl XmlStreamSplitter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            restrict_to: Vec::new(),
            path: path.into(),
        }
    }

    fn path_segments(&self) -> Vec<&str> {
        self.path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn at_path(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}

impl ImporterHandler for XmlStreamSplitter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Splitter for XmlStreamSplitter {
    fn split_applicable(
        &self,
        doc: &mut HandlerDoc,
        input: &mut dyn Read,
        _output: &mut dyn Write,
    ) -> HandlerResult<Vec<SplitDocument>> {
        let path = self.path_segments();
        if path.is_empty() {
            return Err(HandlerError::config(NAME, "path cannot be blank"));
        }
        let content = read_content(doc, input)?;
        let bad_xml = |e: quick_xml::Error| HandlerError::processing(&doc.reference, format!("bad XML: {e}"));

        let mut reader = Reader::from_str(&content);
        let mut stack: Vec<String> = Vec::new();
        let mut capture: Option<Writer<Vec<u8>>> = None;
        let mut fragments: Vec<Vec<u8>> = Vec::new();

        loop {
            let event = reader.read_event().map_err(bad_xml)?;
            match &event {
                Event::Start(e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    if capture.is_none() && at_path(&stack, &path) {
                        capture = Some(Writer::new(Vec::new()));
                    }
                    if let Some(writer) = capture.as_mut() {
                        writer.write_event(&event).map_err(bad_xml)?;
                    }
                }
                Event::End(_) => {
                    if let Some(writer) = capture.as_mut() {
                        writer.write_event(&event).map_err(bad_xml)?;
                    }
                    if capture.is_some() && at_path(&stack, &path) {
                        if let Some(writer) = capture.take() {
                            fragments.push(writer.into_inner());
                        }
                    }
                    stack.pop();
                }
                Event::Empty(e) => {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    match capture.as_mut() {
                        Some(writer) => writer.write_event(&event).map_err(bad_xml)?,
                        None if at_path(&stack, &path) => {
                            let mut writer = Writer::new(Vec::new());
                            writer.write_event(&event).map_err(bad_xml)?;
                            fragments.push(writer.into_inner());
                        }
                        None => {}
                    }
                    stack.pop();
                }
                Event::Eof => break,
                _ => {
                    if let Some(writer) = capture.as_mut() {
                        writer.write_event(&event).map_err(bad_xml)?;
                    }
                }
            }
        }
        if capture.is_some() {
            return Err(HandlerError::processing(&doc.reference, "XML ended inside a split element"));
        }

        let children: Vec<SplitDocument> = fragments
            .into_iter()
            .enumerate()
            .map(|(i, xml)| SplitDocument::new_child(&doc.reference, &(i + 1).to_string(), xml))
            .collect();
        debug!(handler = NAME, reference = %doc.reference, children = children.len(), "XML split");
        Ok(children)
    }
}
