use crate::handlers::{HandlerResult, ImporterHandler, Tagger};
use crate::matcher::Restriction;
use crate::setter::PropertySetter;
use crate::types::HandlerDoc;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::warn;

const NAME: &str = "ConstantTagger";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Adds fixed values to fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstantTagger {
    #[serde(default)]
    pub restrict_to: Vec<Restriction>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub on_set: PropertySetter,
}

impl ImporterHandler for ConstantTagger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn restrictions(&self) -> &[Restriction] {
        &self.restrict_to
    }
}

impl Tagger for ConstantTagger {
    fn tag_applicable(&self, doc: &mut HandlerDoc, _input: &mut dyn Read) -> HandlerResult<()> {
        for constant in &self.constants {
            if constant.name.trim().is_empty() {
                warn!(handler = NAME, "constant without a name ignored");
                continue;
            }
            self.on_set
                .apply(&mut doc.metadata, &constant.name, constant.values.clone());
        }
        Ok(())
    }
}
