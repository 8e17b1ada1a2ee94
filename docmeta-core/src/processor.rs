use crate::config::{HandlerConfig, HandlerRef, ImporterConfig};
use crate::handlers::{Filter, OnMatch};
use crate::types::*;
use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::io::Cursor;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        debug!(step = step_name, elapsed_us = elapsed.as_micros() as u64, "step done");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<45} {:.3}ms ({:.1}%)",
                step,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("   {:.<45} {:.3}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ImportStatus {
    Accepted,
    /// Rejected by the named filter
    Rejected { filter: String },
}

impl ImportStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ImportStatus::Accepted)
    }
}

/// Outcome of importing one document, children included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResponse {
    pub reference: String,
    pub status: ImportStatus,
    pub metadata: Metadata,
    #[serde(serialize_with = "content_as_text")]
    pub content: Vec<u8>,
    pub children: Vec<ImportResponse>,
}

impl ImportResponse {
    pub fn content_text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// This document and all its descendants, depth first
    pub fn flatten(&self) -> Vec<&ImportResponse> {
        let mut all = vec![self];
        for child in &self.children {
            all.extend(child.flatten());
        }
        all
    }
}

fn content_as_text<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(content))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PreParse,
    PostParse,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::PreParse => "pre-parse",
            Phase::PostParse => "post-parse",
        }
    }

    fn parse_state(self) -> ParseState {
        match self {
            Phase::PreParse => ParseState::Pre,
            Phase::PostParse => ParseState::Post,
        }
    }
}

/// Accumulates the verdicts of consecutive filters
#[derive(Default)]
struct FilterGroup {
    has_include: bool,
    include_accepted: bool,
    last_include: Option<&'static str>,
}

impl FilterGroup {
    fn record(&mut self, filter: &dyn Filter, accepted: bool) -> Option<ImportStatus> {
        match filter.on_match() {
            // one rejecting exclude filter is enough
            OnMatch::Exclude if !accepted => Some(ImportStatus::Rejected {
                filter: filter.name().to_string(),
            }),
            OnMatch::Exclude => None,
            OnMatch::Include => {
                self.has_include = true;
                self.include_accepted |= accepted;
                self.last_include = Some(filter.name());
                None
            }
        }
    }

    /// Verdict once the group is over; resets the group
    fn close(&mut self) -> Option<ImportStatus> {
        let group = std::mem::take(self);
        if group.has_include && !group.include_accepted {
            return Some(ImportStatus::Rejected {
                filter: group.last_include.unwrap_or_default().to_string(),
            });
        }
        None
    }
}

/// Working state of a document going through the handlers
struct Working {
    doc: HandlerDoc,
    content: Vec<u8>,
    children: Vec<ImportResponse>,
}

impl Working {
    fn into_response(self, status: ImportStatus) -> ImportResponse {
        ImportResponse {
            reference: self.doc.reference,
            status,
            metadata: self.doc.metadata,
            content: self.content,
            children: self.children,
        }
    }
}

/// Runs documents through the configured handlers and parser
pub struct DocumentImporter {
    config: ImporterConfig,
    profiling: bool,
}

impl DocumentImporter {
    pub fn new(config: ImporterConfig) -> Self {
        Self {
            config,
            profiling: false,
        }
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    pub fn import_document(
        &self,
        reference: &str,
        content: Vec<u8>,
        metadata: Metadata,
    ) -> Result<ImportResponse> {
        let mut profiler = StepProfiler::new(self.profiling);
        let response = self.import_with_profiler(reference, content, metadata, &mut profiler)?;
        profiler.print_summary();
        Ok(response)
    }

    /// Same as `import_document`, leaving the timings to the caller
    pub fn import_with_profiler(
        &self,
        reference: &str,
        content: Vec<u8>,
        mut metadata: Metadata,
        profiler: &mut StepProfiler,
    ) -> Result<ImportResponse> {
        metadata.set(DOC_REFERENCE, vec![reference.to_string()]);
        let working = Working {
            doc: HandlerDoc::new(reference, metadata, ParseState::Pre),
            content,
            children: Vec::new(),
        };
        let response = self.run(working, Phase::PreParse, 0, profiler)?;
        info!(
            reference,
            accepted = response.status.is_accepted(),
            children = response.children.len(),
            "document imported"
        );
        Ok(response)
    }

    /// Run `working` from handler `start` of `phase` to the end of the pipeline
    fn run(
        &self,
        mut working: Working,
        phase: Phase,
        start: usize,
        profiler: &mut StepProfiler,
    ) -> Result<ImportResponse> {
        let mut start = start;
        if phase == Phase::PreParse {
            let handlers = &self.config.pre_parse_handlers;
            if let Some(status) = self.run_phase(&mut working, handlers, Phase::PreParse, start, profiler)? {
                return Ok(working.into_response(status));
            }
            self.parse(&mut working, profiler)?;
            start = 0;
        }

        let handlers = &self.config.post_parse_handlers;
        if let Some(status) = self.run_phase(&mut working, handlers, Phase::PostParse, start, profiler)? {
            return Ok(working.into_response(status));
        }
        Ok(working.into_response(ImportStatus::Accepted))
    }

    fn parse(&self, working: &mut Working, profiler: &mut StepProfiler) -> Result<()> {
        let parser = self
            .config
            .parser
            .parser_for(&working.content, &working.doc.metadata);
        let reference = working.doc.reference.clone();
        let step = format!("parse: {}", parser.name());

        let text = profiler.time_step(&step, || {
            parser.parse(&reference, &working.content, &mut working.doc.metadata)
        });
        working.content =
            text.with_context(|| format!("{} failed on \"{}\"", parser.name(), reference))?;
        working.doc.parse_state = ParseState::Post;
        Ok(())
    }

    /// Returns a rejection status when a filter group rejected the document
    fn run_phase(
        &self,
        working: &mut Working,
        handlers: &[HandlerConfig],
        phase: Phase,
        start: usize,
        profiler: &mut StepProfiler,
    ) -> Result<Option<ImportStatus>> {
        let mut group = FilterGroup::default();

        for (index, config) in handlers.iter().enumerate().skip(start) {
            let handler = config.handler();
            let name = handler.name();
            let reference = working.doc.reference.clone();
            let context = || format!("{} failed on \"{}\" ({} handler {})", name, reference, phase.label(), index);
            let step = format!("{}: {}", phase.label(), name);

            if !matches!(handler, HandlerRef::Filter(_)) {
                if let Some(status) = group.close() {
                    debug!(reference = %reference, ?status, "document rejected");
                    return Ok(Some(status));
                }
            }

            match handler {
                HandlerRef::Tagger(tagger) => {
                    let Working { doc, content, .. } = &mut *working;
                    profiler
                        .time_step(&step, || tagger.tag(doc, &mut Cursor::new(content.as_slice())))
                        .with_context(context)?;
                }
                HandlerRef::Transformer(transformer) => {
                    let Working { doc, content, .. } = &mut *working;
                    let mut output = Vec::with_capacity(content.len());
                    profiler
                        .time_step(&step, || {
                            transformer.transform(doc, &mut Cursor::new(content.as_slice()), &mut output)
                        })
                        .with_context(context)?;
                    *content = output;
                }
                HandlerRef::Splitter(splitter) => {
                    let Working { doc, content, .. } = &mut *working;
                    let mut output = Vec::new();
                    let split = profiler
                        .time_step(&step, || {
                            splitter.split(doc, &mut Cursor::new(content.as_slice()), &mut output)
                        })
                        .with_context(context)?;
                    *content = output;

                    debug!(handler = name, reference = %reference, children = split.len(), "document split");
                    for child in split {
                        let child_working = Working {
                            doc: HandlerDoc::new(child.reference, child.metadata, phase.parse_state()),
                            content: child.content,
                            children: Vec::new(),
                        };
                        let response = self.run(child_working, phase, index + 1, profiler)?;
                        working.children.push(response);
                    }
                }
                HandlerRef::Filter(filter) => {
                    let Working { doc, content, .. } = &*working;
                    let accepted = profiler
                        .time_step(&step, || filter.accept(doc, &mut Cursor::new(content.as_slice())))
                        .with_context(context)?;
                    debug!(handler = name, reference = %reference, accepted, "filter evaluated");
                    if let Some(status) = group.record(filter, accepted) {
                        return Ok(Some(status));
                    }
                }
            }
        }

        let status = group.close();
        if let Some(status) = &status {
            debug!(reference = %working.doc.reference, ?status, "document rejected");
        }
        Ok(status)
    }
}
