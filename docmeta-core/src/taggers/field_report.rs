use crate::handlers::{default_true, HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::text;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

const NAME: &str = "FieldReportTagger";

fn default_max_samples() -> usize {
    3
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldStats {
    /// Spelling of the first occurrence
    pub name: String,
    /// Number of documents having the field
    pub occurrences: u64,
    pub samples: Vec<String>,
}

/// Reports every field seen across documents in a CSV file.
///
/// The report is shared by clones of the tagger, so one instance can serve
/// documents imported concurrently. The whole file is rewritten under the
/// lock whenever the report changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReportTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub file: PathBuf,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default = "default_true")]
    pub with_headers: bool,
    #[serde(default = "default_true")]
    pub with_occurrences: bool,
    #[serde(default)]
    pub truncate_samples_at: Option<usize>,
    #[serde(skip)]
    report: Arc<Mutex<BTreeMap<String, FieldStats>>>,
}

impl FieldReportTagger {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            restrict_to: Vec::new(),
            file: file.into(),
            max_samples: default_max_samples(),
            with_headers: true,
            with_occurrences: true,
            truncate_samples_at: None,
            report: Arc::default(),
        }
    }

    /// Snapshot of the report, sorted by lowercase field name
    pub fn report(&self) -> Vec<FieldStats> {
        let report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        report.values().cloned().collect()
    }

    fn sample(&self, value: &str) -> String {
        match self.truncate_samples_at {
            Some(max) => text::abbreviate(value, max),
            None => value.to_string(),
        }
    }

    /// Returns whether the report changed
    fn update(&self, report: &mut BTreeMap<String, FieldStats>, doc: &HandlerDoc) -> bool {
        let mut changed = false;
        for (name, values) in doc.metadata.iter() {
            let stats = report.entry(name.to_lowercase()).or_insert_with(|| {
                changed = true;
                FieldStats {
                    name: name.to_string(),
                    ..Default::default()
                }
            });
            stats.occurrences += 1;
            changed |= self.with_occurrences;

            for value in values {
                if stats.samples.len() >= self.max_samples {
                    break;
                }
                let sample = self.sample(value);
                if !sample.trim().is_empty() && !stats.samples.contains(&sample) {
                    stats.samples.push(sample);
                    changed = true;
                }
            }
        }
        changed
    }

    fn write_report(&self, report: &BTreeMap<String, FieldStats>) -> io::Result<()> {
        if let Some(parent) = self.file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_csv(&self.file, report, self.max_samples, self.with_headers, self.with_occurrences)
    }
}

fn write_csv(
    path: &Path,
    report: &BTreeMap<String, FieldStats>,
    max_samples: usize,
    with_headers: bool,
    with_occurrences: bool,
) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::other)?;

    if with_headers {
        let mut header = vec!["Field Name".to_string()];
        if with_occurrences {
            header.push("Occurrences".to_string());
        }
        header.extend((1..=max_samples).map(|i| format!("Sample Value {i}")));
        writer.write_record(&header).map_err(io::Error::other)?;
    }

    for stats in report.values() {
        let mut row = vec![stats.name.clone()];
        if with_occurrences {
            row.push(stats.occurrences.to_string());
        }
        // the writer wants the same number of columns on every row
        for i in 0..max_samples {
            row.push(stats.samples.get(i).cloned().unwrap_or_default());
        }
        writer.write_record(&row).map_err(io::Error::other)?;
    }
    writer.flush()
}

impl PartialEq for FieldReportTagger {
    fn eq(&self, other: &Self) -> bool {
        self.restrict_to == other.restrict_to
            && self.file == other.file
            && self.max_samples == other.max_samples
            && self.with_headers == other.with_headers
            && self.with_occurrences == other.with_occurrences
            && self.truncate_samples_at == other.truncate_samples_at
    }
}

impl ImporterHandler for FieldReportTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for FieldReportTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        if self.file.as_os_str().is_empty() {
            return Err(HandlerError::config(NAME, "file cannot be blank"));
        }
        let mut report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        if self.update(&mut report, doc) {
            debug!(handler = NAME, reference = %doc.reference, file = %self.file.display(), "rewriting field report");
            self.write_report(&report)
                .map_err(|e| HandlerError::io(&doc.reference, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use std::io::Cursor;
    use std::thread;

    fn doc(fields: &[(&str, &str)]) -> HandlerDoc {
        let mut metadata = Metadata::new();
        for (name, value) in fields {
            metadata.add(name, *value);
        }
        HandlerDoc::new("doc", metadata, ParseState::Post)
    }

    #[test]
    fn test_report_written_as_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("fields.csv");
        let mut tagger = FieldReportTagger::new(&path);
        tagger.max_samples = 2;

        tagger
            .tag(&mut doc(&[("title", "Apple"), ("author", "Jo")]), &mut Cursor::new(b""))
            .unwrap();
        tagger
            .tag(&mut doc(&[("Title", "Pear"), ("title", "Kiwi")]), &mut Cursor::new(b""))
            .unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Field Name,Occurrences,Sample Value 1,Sample Value 2",
                "author,1,Jo,",
                "title,2,Apple,Pear",
            ]
        );
    }

    #[test]
    fn test_without_headers_and_occurrences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.csv");
        let mut tagger = FieldReportTagger::new(&path);
        tagger.with_headers = false;
        tagger.with_occurrences = false;
        tagger.max_samples = 1;
        tagger.truncate_samples_at = Some(5);

        tagger
            .tag(&mut doc(&[("body", "a rather long value")]), &mut Cursor::new(b""))
            .unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv.trim_end(), "body,a...");
    }

    #[test]
    fn test_clones_share_the_report_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let tagger = FieldReportTagger::new(dir.path().join("fields.csv"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tagger = tagger.clone();
                thread::spawn(move || {
                    let value = format!("v{i}");
                    tagger
                        .tag(&mut doc(&[("shared", value.as_str())]), &mut Cursor::new(b""))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let report = tagger.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].occurrences, 8);
        assert_eq!(report[0].samples.len(), 3);
    }

    #[test]
    fn test_unwritable_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as the report file
        let tagger = FieldReportTagger::new(dir.path());
        let err = tagger
            .tag(&mut doc(&[("a", "b")]), &mut Cursor::new(b""))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Io { .. }));
    }
}
