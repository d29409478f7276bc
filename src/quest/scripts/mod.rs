//! Built-in quest scripts
//!
//! Quest files name a script kind; this module turns a validated
//! definition into the script that drives it.

use std::sync::Arc;
use tracing::debug;

use crate::config::RateConfig;
use crate::error::{QuestError, Result};

use super::definition::QuestDefinition;
use super::script::QuestScript;

pub mod mutated_kaneus;

pub use mutated_kaneus::MutatedKaneus;

/// Script kinds shipped with this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Two-tissue hunt with a giver and a turn-in NPC
    MutatedKaneus,
}

impl ScriptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptKind::MutatedKaneus => "mutated_kaneus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mutated_kaneus" => Some(ScriptKind::MutatedKaneus),
            _ => None,
        }
    }
}

/// Build the script named by `definition.script`
pub fn build_script(definition: QuestDefinition, rates: RateConfig) -> Result<Arc<dyn QuestScript>> {
    let kind = ScriptKind::from_str(&definition.script)
        .ok_or_else(|| QuestError::UnknownScript(definition.script.clone()))?;
    debug!("Building {} script for quest {}", kind.as_str(), definition.id);

    match kind {
        ScriptKind::MutatedKaneus => Ok(Arc::new(MutatedKaneus::new(definition, rates))),
    }
}
