//! Quest Script Interface
//!
//! A quest script is the per-quest decision table the host calls into on
//! dialogue choices, NPC talk and NPC kills.

use super::api::{QuestEffect, QuestHost};
use super::definition::{NpcId, QuestDefinition};
use super::state::QuestState;

/// Host default shown when no quest has anything to say
pub const NO_QUEST_MSG: &str = "<html><body>You are either not on a quest that involves this NPC, or you don't meet this NPC's minimum quest requirements.</body></html>";

pub const ALREADY_COMPLETED_MSG: &str = "<html><body>This quest has already been completed.</body></html>";

/// What the client should be shown next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialogue {
    /// Quest page (branch token), e.g. `31981-01.htm`
    Page(String),
    /// Host "no quest" default
    NoQuest,
    /// Host "already completed" default
    AlreadyCompleted,
}

impl Dialogue {
    /// Page `<npc>-<nn>.htm`
    pub fn page(npc: NpcId, number: u8) -> Self {
        Dialogue::Page(page_name(npc, number))
    }

    /// Branch token or inline HTML to send to the client
    pub fn as_html(&self) -> &str {
        match self {
            Dialogue::Page(token) => token,
            Dialogue::NoQuest => NO_QUEST_MSG,
            Dialogue::AlreadyCompleted => ALREADY_COMPLETED_MSG,
        }
    }

    /// True for the host fallback messages
    pub fn is_default(&self) -> bool {
        !matches!(self, Dialogue::Page(_))
    }
}

pub fn page_name(npc: NpcId, number: u8) -> String {
    format!("{}-{:02}.htm", npc, number)
}

/// Read-only view a talk handler decides on
#[derive(Debug, Clone, Copy)]
pub struct TalkContext<'a> {
    pub player_id: &'a str,
    pub player_level: i32,
    /// `None` when the player has never touched the quest
    pub state: Option<&'a QuestState>,
}

/// Result from running a script handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptResult {
    /// Dialogue to show (if any)
    pub dialogue: Option<Dialogue>,
    /// Side effects for the host to apply, in order
    pub effects: Vec<QuestEffect>,
}

impl ScriptResult {
    pub fn show(dialogue: Dialogue) -> Self {
        Self {
            dialogue: Some(dialogue),
            effects: Vec::new(),
        }
    }

    /// Nothing happened
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: QuestEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.dialogue.is_none() && self.effects.is_empty()
    }
}

/// Behaviour of a single quest
pub trait QuestScript: Send + Sync {
    fn definition(&self) -> &QuestDefinition;

    /// Dialogue choice / advance event. `state` is the player's existing
    /// record; the caller handles the no-state case.
    fn on_event(&self, player_id: &str, event: &str, state: &mut QuestState) -> ScriptResult;

    /// Pure: pick the page for a talk without touching state
    fn on_talk(&self, npc: NpcId, ctx: &TalkContext<'_>) -> Dialogue;

    /// Kill notification; may read and update party members' states
    fn on_kill(&self, npc: NpcId, killer_id: &str, host: &mut dyn QuestHost) -> ScriptResult;
}
