//! Quest System Module
//!
//! Per-player quest state machines driven by host callbacks. Quest metadata
//! comes from TOML; behaviour comes from built-in Rust scripts.

pub mod api;
pub mod definition;
pub mod events;
pub mod party;
pub mod registry;
pub mod script;
pub mod scripts;
pub mod state;

pub use api::{QuestEffect, QuestHost, Sound};
pub use definition::{DropEntry, ItemId, NpcId, NpcRole, QuestDefinition, QuestId, Reward};
pub use events::QuestEvent;
pub use registry::{HotReloadEvent, QuestRegistry};
pub use script::{Dialogue, QuestScript, ScriptResult, TalkContext};
pub use scripts::{MutatedKaneus, ScriptKind};
pub use state::{PlayerQuestState, QuestPhase, QuestState};
