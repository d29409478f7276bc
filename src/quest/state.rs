//! Quest State Tracking
//!
//! Per-player, per-quest progress: lifecycle phase, sub-step condition and
//! quest item counts. The host owns these records and hands them to scripts.

use std::collections::{BTreeMap, HashMap};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::definition::{ItemId, QuestId};

/// Lifecycle stage of a quest for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestPhase {
    /// Player has met the quest giver but not accepted
    Created,
    /// Quest accepted and in progress
    Started,
    /// Quest finished; terminal unless repeatable
    Completed,
}

/// One player's progress in one quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestState {
    pub quest_id: QuestId,
    phase: QuestPhase,
    /// Sub-step marker, only set while started
    cond: Option<u8>,
    /// Held quest items; keys are the quest's whitelist
    items: BTreeMap<ItemId, u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestState {
    /// Fresh record in the `Created` phase holding none of `quest_items`
    pub fn new(quest_id: QuestId, quest_items: &[ItemId]) -> Self {
        Self {
            quest_id,
            phase: QuestPhase::Created,
            cond: None,
            items: quest_items.iter().map(|&item| (item, 0)).collect(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn phase(&self) -> QuestPhase {
        self.phase
    }

    pub fn cond(&self) -> Option<u8> {
        self.cond
    }

    pub fn is_started(&self) -> bool {
        self.phase == QuestPhase::Started
    }

    pub fn is_completed(&self) -> bool {
        self.phase == QuestPhase::Completed
    }

    /// Accept the quest: `Started` with the given first step
    pub fn start(&mut self, cond: u8) {
        self.phase = QuestPhase::Started;
        self.cond = Some(cond);
        self.started_at = Some(Utc::now());
    }

    /// Move to another step; ignored unless started
    pub fn set_cond(&mut self, cond: u8) -> bool {
        if self.phase != QuestPhase::Started {
            return false;
        }
        self.cond = Some(cond);
        true
    }

    pub fn clear_cond(&mut self) {
        self.cond = None;
    }

    /// Count of a quest item; zero for items outside the whitelist
    pub fn item_count(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn has_item(&self, item: ItemId) -> bool {
        self.item_count(item) > 0
    }

    /// True when every whitelisted item is held at least once
    pub fn has_all_items(&self) -> bool {
        !self.items.is_empty() && self.items.values().all(|&count| count > 0)
    }

    /// Grant `count` of `item` without exceeding `max`.
    /// Returns the number actually granted (0 for non-quest items or a full stack).
    pub fn give_item(&mut self, item: ItemId, count: u32, max: u32) -> u32 {
        let Some(held) = self.items.get_mut(&item) else {
            return 0;
        };
        let granted = count.min(max.saturating_sub(*held));
        *held += granted;
        granted
    }

    /// End the quest. Quest items are removed either way; a repeatable quest
    /// goes back to a fresh `Created` record, otherwise it is `Completed`.
    /// Returns the items that were taken away.
    pub fn exit_quest(&mut self, repeatable: bool) -> Vec<(ItemId, u32)> {
        self.cond = None;
        let removed: Vec<(ItemId, u32)> = self
            .items
            .iter_mut()
            .filter(|(_, count)| **count > 0)
            .map(|(item, count)| (*item, std::mem::take(count)))
            .collect();
        if repeatable {
            self.phase = QuestPhase::Created;
            self.started_at = None;
            self.completed_at = None;
        } else {
            self.phase = QuestPhase::Completed;
            self.completed_at = Some(Utc::now());
        }
        removed
    }

    /// Serialize for host-side storage
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

/// All quest state for a single player
#[derive(Debug, Clone, Default)]
pub struct PlayerQuestState {
    quests: HashMap<QuestId, QuestState>,
}

impl PlayerQuestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quest_id: QuestId) -> Option<&QuestState> {
        self.quests.get(&quest_id)
    }

    pub fn get_mut(&mut self, quest_id: QuestId) -> Option<&mut QuestState> {
        self.quests.get_mut(&quest_id)
    }

    /// Store a state; an existing record for the same quest is kept
    pub fn insert(&mut self, state: QuestState) -> &mut QuestState {
        self.quests.entry(state.quest_id).or_insert(state)
    }

    pub fn is_quest_completed(&self, quest_id: QuestId) -> bool {
        self.get(quest_id).is_some_and(QuestState::is_completed)
    }

    pub fn is_quest_active(&self, quest_id: QuestId) -> bool {
        self.get(quest_id).is_some_and(QuestState::is_started)
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}
