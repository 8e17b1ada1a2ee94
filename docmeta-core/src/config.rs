use crate::filters::*;
use crate::handlers::{Filter, HandlerResult, Splitter, Tagger, Transformer};
use crate::matcher::TextMatcher;
use crate::parsers::ParserKind;
use crate::splitters::*;
use crate::taggers::*;
use crate::transformers::*;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Pipeline configuration: handlers run on the raw content, the parser, then
/// handlers run on the extracted text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImporterConfig {
    #[serde(default)]
    pub parser: ParserKind,
    #[serde(default)]
    pub pre_parse_handlers: Vec<HandlerConfig>,
    #[serde(default)]
    pub post_parse_handlers: Vec<HandlerConfig>,
}

/// One configured handler. The `handler` key selects the variant, the other
/// keys are the handler's own settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "handler")]
pub enum HandlerConfig {
    // taggers
    CharacterCaseTagger(CharacterCaseTagger),
    ConstantTagger(ConstantTagger),
    CopyTagger(CopyTagger),
    CountMatchesTagger(CountMatchesTagger),
    CurrentDateTagger(CurrentDateTagger),
    DateFormatTagger(DateFormatTagger),
    DebugTagger(DebugTagger),
    DeleteTagger(DeleteTagger),
    FieldReportTagger(FieldReportTagger),
    ForceSingleValueTagger(ForceSingleValueTagger),
    HierarchyTagger(HierarchyTagger),
    KeepOnlyTagger(KeepOnlyTagger),
    MergeTagger(MergeTagger),
    RenameTagger(RenameTagger),
    ReplaceTagger(ReplaceTagger),
    SplitTagger(SplitTagger),
    TextBetweenTagger(TextBetweenTagger),
    TextPatternTagger(TextPatternTagger),
    TextStatisticsTagger(TextStatisticsTagger),
    TitleGeneratorTagger(TitleGeneratorTagger),
    TruncateTagger(TruncateTagger),
    UuidTagger(UuidTagger),
    // transformers
    ReduceConsecutivesTransformer(ReduceConsecutivesTransformer),
    ReplaceTransformer(ReplaceTransformer),
    StripAfterTransformer(StripAfterTransformer),
    StripBeforeTransformer(StripBeforeTransformer),
    StripBetweenTransformer(StripBetweenTransformer),
    SubstringTransformer(SubstringTransformer),
    // splitters
    CsvSplitter(CsvSplitter),
    XmlStreamSplitter(XmlStreamSplitter),
    // filters
    EmptyMetadataFilter(EmptyMetadataFilter),
    NumericMetadataFilter(NumericMetadataFilter),
    RegexContentFilter(RegexContentFilter),
    RegexMetadataFilter(RegexMetadataFilter),
}

/// Every handler a configuration can name, as (kind, name)
pub const AVAILABLE_HANDLERS: &[(&str, &str)] = &[
    ("tagger", "CharacterCaseTagger"),
    ("tagger", "ConstantTagger"),
    ("tagger", "CopyTagger"),
    ("tagger", "CountMatchesTagger"),
    ("tagger", "CurrentDateTagger"),
    ("tagger", "DateFormatTagger"),
    ("tagger", "DebugTagger"),
    ("tagger", "DeleteTagger"),
    ("tagger", "FieldReportTagger"),
    ("tagger", "ForceSingleValueTagger"),
    ("tagger", "HierarchyTagger"),
    ("tagger", "KeepOnlyTagger"),
    ("tagger", "MergeTagger"),
    ("tagger", "RenameTagger"),
    ("tagger", "ReplaceTagger"),
    ("tagger", "SplitTagger"),
    ("tagger", "TextBetweenTagger"),
    ("tagger", "TextPatternTagger"),
    ("tagger", "TextStatisticsTagger"),
    ("tagger", "TitleGeneratorTagger"),
    ("tagger", "TruncateTagger"),
    ("tagger", "UuidTagger"),
    ("transformer", "ReduceConsecutivesTransformer"),
    ("transformer", "ReplaceTransformer"),
    ("transformer", "StripAfterTransformer"),
    ("transformer", "StripBeforeTransformer"),
    ("transformer", "StripBetweenTransformer"),
    ("transformer", "SubstringTransformer"),
    ("splitter", "CsvSplitter"),
    ("splitter", "XmlStreamSplitter"),
    ("filter", "EmptyMetadataFilter"),
    ("filter", "NumericMetadataFilter"),
    ("filter", "RegexContentFilter"),
    ("filter", "RegexMetadataFilter"),
];

/// A configured handler seen through its variant trait
#[derive(Clone, Copy)]
pub enum HandlerRef<'a> {
    Tagger(&'a dyn Tagger),
    Transformer(&'a dyn Transformer),
    Splitter(&'a dyn Splitter),
    Filter(&'a dyn Filter),
}

impl HandlerRef<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerRef::Tagger(h) => h.name(),
            HandlerRef::Transformer(h) => h.name(),
            HandlerRef::Splitter(h) => h.name(),
            HandlerRef::Filter(h) => h.name(),
        }
    }

    pub fn validate(&self) -> HandlerResult<()> {
        match self {
            HandlerRef::Tagger(h) => h.validate(),
            HandlerRef::Transformer(h) => h.validate(),
            HandlerRef::Splitter(h) => h.validate(),
            HandlerRef::Filter(h) => h.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HandlerRef::Tagger(_) => "tagger",
            HandlerRef::Transformer(_) => "transformer",
            HandlerRef::Splitter(_) => "splitter",
            HandlerRef::Filter(_) => "filter",
        }
    }
}

impl HandlerConfig {
    pub fn handler(&self) -> HandlerRef<'_> {
        use HandlerConfig as H;
        match self {
            H::CharacterCaseTagger(h) => HandlerRef::Tagger(h),
            H::ConstantTagger(h) => HandlerRef::Tagger(h),
            H::CopyTagger(h) => HandlerRef::Tagger(h),
            H::CountMatchesTagger(h) => HandlerRef::Tagger(h),
            H::CurrentDateTagger(h) => HandlerRef::Tagger(h),
            H::DateFormatTagger(h) => HandlerRef::Tagger(h),
            H::DebugTagger(h) => HandlerRef::Tagger(h),
            H::DeleteTagger(h) => HandlerRef::Tagger(h),
            H::FieldReportTagger(h) => HandlerRef::Tagger(h),
            H::ForceSingleValueTagger(h) => HandlerRef::Tagger(h),
            H::HierarchyTagger(h) => HandlerRef::Tagger(h),
            H::KeepOnlyTagger(h) => HandlerRef::Tagger(h),
            H::MergeTagger(h) => HandlerRef::Tagger(h),
            H::RenameTagger(h) => HandlerRef::Tagger(h),
            H::ReplaceTagger(h) => HandlerRef::Tagger(h),
            H::SplitTagger(h) => HandlerRef::Tagger(h),
            H::TextBetweenTagger(h) => HandlerRef::Tagger(h),
            H::TextPatternTagger(h) => HandlerRef::Tagger(h),
            H::TextStatisticsTagger(h) => HandlerRef::Tagger(h),
            H::TitleGeneratorTagger(h) => HandlerRef::Tagger(h),
            H::TruncateTagger(h) => HandlerRef::Tagger(h),
            H::UuidTagger(h) => HandlerRef::Tagger(h),
            H::ReduceConsecutivesTransformer(h) => HandlerRef::Transformer(h),
            H::ReplaceTransformer(h) => HandlerRef::Transformer(h),
            H::StripAfterTransformer(h) => HandlerRef::Transformer(h),
            H::StripBeforeTransformer(h) => HandlerRef::Transformer(h),
            H::StripBetweenTransformer(h) => HandlerRef::Transformer(h),
            H::SubstringTransformer(h) => HandlerRef::Transformer(h),
            H::CsvSplitter(h) => HandlerRef::Splitter(h),
            H::XmlStreamSplitter(h) => HandlerRef::Splitter(h),
            H::EmptyMetadataFilter(h) => HandlerRef::Filter(h),
            H::NumericMetadataFilter(h) => HandlerRef::Filter(h),
            H::RegexContentFilter(h) => HandlerRef::Filter(h),
            H::RegexMetadataFilter(h) => HandlerRef::Filter(h),
        }
    }

    pub fn name(&self) -> &'static str {
        self.handler().name()
    }

    /// Compile every matcher in the handler settings, restrictions included
    pub fn validate(&self) -> Result<()> {
        let settings = serde_json::to_value(self)
            .with_context(|| format!("Failed to inspect {} settings", self.name()))?;
        let mut matchers = Vec::new();
        collect_matchers(&settings, &mut matchers);
        for matcher in matchers {
            let matcher: TextMatcher = serde_json::from_value(matcher.clone())
                .with_context(|| format!("Failed to read a {} matcher", self.name()))?;
            matcher
                .compile_for_values()
                .with_context(|| format!("Bad pattern {:?} in {}", matcher.pattern, self.name()))?;
        }
        self.handler().validate()?;
        Ok(())
    }
}

/// Objects shaped like a serialized `TextMatcher`
fn collect_matchers<'a>(value: &'a serde_json::Value, found: &mut Vec<&'a serde_json::Value>) {
    match value {
        serde_json::Value::Object(map) => {
            if map.contains_key("pattern") && map.contains_key("method") {
                found.push(value);
                return;
            }
            map.values().for_each(|v| collect_matchers(v, found));
        }
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_matchers(v, found)),
        _ => {}
    }
}

impl ImporterConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ImporterConfig =
            serde_yaml::from_str(yaml).context("Failed to parse importer configuration")?;
        Ok(config)
    }

    /// Load and validate config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to an empty pipeline
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                warn!(path = p, error = %format!("{e:#}"), "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let phases = [
            ("pre_parse_handlers", &self.pre_parse_handlers),
            ("post_parse_handlers", &self.post_parse_handlers),
        ];
        for (phase, handlers) in phases {
            for (i, handler) in handlers.iter().enumerate() {
                handler
                    .validate()
                    .with_context(|| format!("{}[{}] ({})", phase, i, handler.name()))?;
            }
        }
        if self.handler_count() == 0 {
            warn!("importer configuration has no handlers");
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.pre_parse_handlers.len() + self.post_parse_handlers.len()
    }

    /// Handlers by phase, for listing
    pub fn describe(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        let pre = self.pre_parse_handlers.iter().map(|h| ("pre-parse", h));
        let post = self.post_parse_handlers.iter().map(|h| ("post-parse", h));
        pre.chain(post)
            .map(|(phase, h)| {
                let handler = h.handler();
                (phase, handler.kind(), handler.name())
            })
            .collect()
    }
}

/// Parse a single handler block, mostly for tests and tooling
pub fn handler_from_yaml(yaml: &str) -> Result<HandlerConfig> {
    serde_yaml::from_str(yaml).context("Failed to parse handler")
}
