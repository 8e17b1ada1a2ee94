use super::current_date::check_format;
use crate::handlers::{HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::warn;

const NAME: &str = "DateFormatTagger";

/// Epoch milliseconds instead of a strftime pattern
pub const EPOCH_FORMAT: &str = "EPOCH";

fn default_to_format() -> String {
    EPOCH_FORMAT.to_string()
}

/// Reformats dates found in a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFormatTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub from_field: String,
    /// Formats in place when absent
    #[serde(default)]
    pub to_field: Option<String>,
    /// Tried in order; none means epoch milliseconds
    #[serde(default)]
    pub from_formats: Vec<String>,
    #[serde(default = "default_to_format")]
    pub to_format: String,
    #[serde(default)]
    pub keep_bad_dates: bool,
    #[serde(default)]
    pub on_set: PropertySetter,
}

impl Default for DateFormatTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            from_field: String::new(),
            to_field: None,
            from_formats: Vec::new(),
            to_format: default_to_format(),
            keep_bad_dates: false,
            on_set: PropertySetter::default(),
        }
    }
}

fn parse_date(value: &str, format: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if format == EPOCH_FORMAT {
        return value
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis);
    }
    if let Ok(date) = DateTime::parse_from_str(value, format) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

fn format_date(date: DateTime<Utc>, format: &str) -> String {
    if format == EPOCH_FORMAT {
        date.timestamp_millis().to_string()
    } else {
        date.format(format).to_string()
    }
}

impl DateFormatTagger {
    fn convert(&self, value: &str) -> Option<String> {
        let epoch = [EPOCH_FORMAT.to_string()];
        let formats = if self.from_formats.is_empty() {
            &epoch[..]
        } else {
            &self.from_formats[..]
        };
        formats
            .iter()
            .find_map(|format| parse_date(value, format))
            .map(|date| format_date(date, &self.to_format))
    }
}

impl ImporterHandler for DateFormatTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for DateFormatTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        if self.from_field.trim().is_empty() {
            return Err(HandlerError::config(NAME, "from_field cannot be blank"));
        }
        for format in self.from_formats.iter().chain(Some(&self.to_format)) {
            if format != EPOCH_FORMAT {
                check_format(NAME, format)?;
            }
        }

        let Some(values) = doc.metadata.get(&self.from_field) else {
            return Ok(());
        };
        let mut converted = Vec::with_capacity(values.len());
        for value in values {
            match self.convert(value) {
                Some(date) => converted.push(date),
                None => {
                    warn!(
                        handler = NAME,
                        reference = %doc.reference,
                        field = %self.from_field,
                        value = %value,
                        "could not parse date"
                    );
                    if self.keep_bad_dates {
                        converted.push(value.clone());
                    }
                }
            }
        }

        match self
            .to_field
            .as_deref()
            .filter(|f| !f.trim().is_empty() && !f.eq_ignore_ascii_case(&self.from_field))
        {
            Some(to_field) => self.on_set.apply(&mut doc.metadata, to_field, converted),
            None => doc.metadata.set(&self.from_field, converted),
        }
        Ok(())
    }
}
