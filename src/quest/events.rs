//! Quest Event Types
//!
//! Host callbacks that drive quest scripts.

use serde::{Deserialize, Serialize};

use super::definition::{NpcId, QuestId};

/// Events the host reports to the quest layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QuestEvent {
    /// Player opened a conversation with an NPC
    NpcTalk {
        player_id: String,
        npc_id: NpcId,
    },

    /// Player clicked a quest link (branch token) in a dialogue
    DialogueChoice {
        player_id: String,
        quest_id: QuestId,
        /// Branch token, e.g. `31981-03.htm`
        token: String,
    },

    /// Player (or their pet) killed an NPC
    NpcKilled {
        player_id: String,
        npc_id: NpcId,
    },
}

impl QuestEvent {
    /// Get the player ID associated with this event
    pub fn player_id(&self) -> &str {
        match self {
            QuestEvent::NpcTalk { player_id, .. } => player_id,
            QuestEvent::DialogueChoice { player_id, .. } => player_id,
            QuestEvent::NpcKilled { player_id, .. } => player_id,
        }
    }

    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            QuestEvent::NpcTalk { .. } => "npc_talk",
            QuestEvent::DialogueChoice { .. } => "dialogue_choice",
            QuestEvent::NpcKilled { .. } => "npc_killed",
        }
    }
}
