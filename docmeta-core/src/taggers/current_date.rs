use crate::handlers::{HandlerError, HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "CurrentDateTagger";

pub const DEFAULT_CURRENT_DATE_FIELD: &str = "document.importedDate";

fn default_to_field() -> String {
    DEFAULT_CURRENT_DATE_FIELD.to_string()
}

/// Stores the import date, as epoch milliseconds unless a format is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDateTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    #[serde(default = "default_to_field")]
    pub to_field: String,
    /// chrono strftime pattern
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub on_set: PropertySetter,
}

impl Default for CurrentDateTagger {
    fn default() -> Self {
        Self {
            restrict_to: Vec::new(),
            to_field: default_to_field(),
            format: None,
            on_set: PropertySetter::default(),
        }
    }
}

/// Fail on strftime patterns chrono cannot render
pub(crate) fn check_format(handler: &'static str, format: &str) -> HandlerResult<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(HandlerError::config(
            handler,
            format!("invalid date format \"{format}\""),
        ));
    }
    Ok(())
}

impl CurrentDateTagger {
    pub fn format_date(&self, date: DateTime<Utc>) -> HandlerResult<String> {
        match self.format.as_deref().filter(|f| !f.trim().is_empty()) {
            Some(format) => {
                check_format(NAME, format)?;
                Ok(date.format(format).to_string())
            }
            None => Ok(date.timestamp_millis().to_string()),
        }
    }
}

impl ImporterHandler for CurrentDateTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for CurrentDateTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        let value = self.format_date(Utc::now())?;
        let to_field = if self.to_field.trim().is_empty() {
            DEFAULT_CURRENT_DATE_FIELD
        } else {
            self.to_field.as_str()
        };
        self.on_set.apply_one(&mut doc.metadata, to_field, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metadata, ParseState};
    use chrono::TimeZone;
    use std::io::Cursor;

    #[test]
    fn test_default_is_epoch_millis() {
        let before = Utc::now().timestamp_millis();
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        CurrentDateTagger::default()
            .tag(&mut doc, &mut Cursor::new(b""))
            .unwrap();
        let stored: i64 = doc.metadata.first_int(DEFAULT_CURRENT_DATE_FIELD).unwrap();
        assert!(stored >= before);
    }

    #[test]
    fn test_format() {
        let tagger = CurrentDateTagger {
            format: Some("%Y-%m-%d".into()),
            ..Default::default()
        };
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 0).unwrap();
        assert_eq!(tagger.format_date(date).unwrap(), "2024-02-29");
    }

    #[test]
    fn test_bad_format_is_a_config_error() {
        let tagger = CurrentDateTagger {
            format: Some("%Q".into()),
            ..Default::default()
        };
        let mut doc = HandlerDoc::new("doc", Metadata::new(), ParseState::Post);
        assert!(matches!(
            tagger.tag(&mut doc, &mut Cursor::new(b"")),
            Err(HandlerError::InvalidConfig { .. })
        ));
        assert!(doc.metadata.is_empty());
    }
}
