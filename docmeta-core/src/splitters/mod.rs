//! Splitters: handlers that turn one document into several.
//!
//! Children get the reference `<parent>!<id>` plus the embedded reference
//! fields; the parent keeps whatever the splitter writes to its output.

pub mod csv;
pub mod xml_stream;

pub use self::csv::CsvSplitter;
pub use xml_stream::XmlStreamSplitter;
