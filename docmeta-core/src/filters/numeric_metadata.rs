use crate::handlers::{field_matcher, Filter, HandlerError, HandlerResult, ImporterHandler, OnMatch};
use crate::matcher::{Restriction, TextMatcher};
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;

const NAME: &str = "NumericMetadataFilter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl Operator {
    pub fn evaluate(self, value: f64, number: f64) -> bool {
        match self {
            Operator::Gt => value > number,
            Operator::Ge => value >= number,
            Operator::Lt => value < number,
            Operator::Le => value <= number,
            Operator::Eq => value == number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericCondition {
    pub operator: Operator,
    pub number: f64,
}

/// Matches documents having a numeric field value meeting every condition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericMetadataFilter {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    pub field_matcher: TextMatcher,
    /// One condition, or two for a range
    pub conditions: Vec<NumericCondition>,
    #[serde(default)]
    pub on_match: OnMatch,
}

impl ImporterHandler for NumericMetadataFilter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Filter for NumericMetadataFilter {
    fn on_match(&self) -> OnMatch {
        self.on_match
    }

    fn is_matched(&self, doc: &HandlerDoc, _input: &mut dyn Read) -> HandlerResult<bool> {
        if self.conditions.is_empty() {
            return Err(HandlerError::config(NAME, "at least one condition is required"));
        }
        let fields = field_matcher(NAME, &self.field_matcher)?;
        Ok(doc
            .metadata
            .iter()
            .filter(|(name, _)| fields.matches(name))
            .flat_map(|(_, values)| values.iter())
            .filter_map(|v| v.trim().parse::<f64>().ok())
            .any(|value| {
                self.conditions
                    .iter()
                    .all(|c| c.operator.evaluate(value, c.number))
            }))
    }
}
