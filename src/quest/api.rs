//! Quest Host API
//!
//! Capabilities the quest layer consumes from the game host. Scripts read
//! player data and quest states through [`QuestHost`] and report side
//! effects as [`QuestEffect`] values, which the registry hands back to the
//! host to apply.

use serde::{Deserialize, Serialize};

use super::definition::{ItemId, QuestId};
use super::state::QuestState;

/// Everything a quest script may ask of the game host
pub trait QuestHost {
    /// Level of an online player
    fn player_level(&self, player_id: &str) -> Option<i32>;

    /// Members of the player's party (including the player), `None` when solo
    fn party_members(&self, player_id: &str) -> Option<Vec<String>>;

    fn quest_state(&self, player_id: &str, quest_id: QuestId) -> Option<&QuestState>;

    fn quest_state_mut(&mut self, player_id: &str, quest_id: QuestId) -> Option<&mut QuestState>;

    /// Attach a new state to the player. `None` if the player is unknown.
    fn insert_quest_state(&mut self, player_id: &str, state: QuestState) -> Option<&mut QuestState>;

    /// Uniform integer in `[0, bound)`
    fn random(&mut self, bound: usize) -> usize;

    /// Fire-and-forget application of a script side effect
    fn apply_effect(&mut self, effect: &QuestEffect);
}

/// Client sound cues played by quest scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    QuestAccept,
    QuestFinish,
    ItemGet,
}

impl Sound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sound::QuestAccept => "ItemSound.quest_accept",
            Sound::QuestFinish => "ItemSound.quest_finish",
            Sound::ItemGet => "ItemSound.quest_itemget",
        }
    }
}

/// Side effect produced by a script handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuestEffect {
    PlaySound {
        player_id: String,
        sound: Sound,
    },
    /// Quest item already recorded on the quest state; host updates inventory
    QuestItemGiven {
        player_id: String,
        quest_id: QuestId,
        item: ItemId,
        count: u32,
    },
    /// Quest items taken back when the quest ended
    QuestItemsRemoved {
        player_id: String,
        quest_id: QuestId,
        items: Vec<(ItemId, u32)>,
    },
    /// Regular item (e.g. currency) to add to the inventory
    RewardItems {
        player_id: String,
        item: ItemId,
        amount: i64,
    },
}

impl QuestEffect {
    pub fn player_id(&self) -> &str {
        match self {
            QuestEffect::PlaySound { player_id, .. } => player_id,
            QuestEffect::QuestItemGiven { player_id, .. } => player_id,
            QuestEffect::QuestItemsRemoved { player_id, .. } => player_id,
            QuestEffect::RewardItems { player_id, .. } => player_id,
        }
    }

    /// Effect type as string (for logging)
    pub fn effect_type(&self) -> &'static str {
        match self {
            QuestEffect::PlaySound { .. } => "play_sound",
            QuestEffect::QuestItemGiven { .. } => "quest_item_given",
            QuestEffect::QuestItemsRemoved { .. } => "quest_items_removed",
            QuestEffect::RewardItems { .. } => "reward_items",
        }
    }
}
