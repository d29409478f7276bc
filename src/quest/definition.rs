//! Quest Definition Structures
//!
//! These structures are deserialized from TOML quest files. A definition is
//! the registration record of a quest: which NPCs start it, which NPCs talk
//! about it, which kills feed it, and which items belong to it.

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result};

/// Numeric quest identifier (e.g. 10280)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub u32);

/// NPC template identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(pub u32);

/// Item template identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quest definition file
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Built-in script kind that drives this quest
    pub script: String,
    #[serde(default)]
    pub level_required: i32,
    #[serde(default)]
    pub start_npcs: Vec<u32>,
    #[serde(default)]
    pub talk_npcs: Vec<u32>,
    /// Items that only exist for this quest
    #[serde(default)]
    pub quest_items: Vec<u32>,
    pub npcs: RawQuestNpcs,
    #[serde(default)]
    pub drops: Vec<RawDrop>,
    #[serde(default)]
    pub rewards: RawReward,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestNpcs {
    pub giver: u32,
    pub turn_in: u32,
}

/// Raw drop entry: killing `npc` yields `count` of `item`, up to `max` held
#[derive(Debug, Clone, Deserialize)]
pub struct RawDrop {
    pub npc: u32,
    pub item: u32,
    #[serde(default = "default_one")]
    pub count: u32,
    #[serde(default = "default_one")]
    pub max: u32,
}

fn default_one() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReward {
    /// Currency item (57 is the base currency)
    #[serde(default = "default_currency")]
    pub currency: u32,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub repeatable: bool,
}

fn default_currency() -> u32 {
    57
}

// ============================================================================
// Resolved Quest Structures (after parsing)
// ============================================================================

/// What part an NPC plays in a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcRole {
    /// Offers the quest and tracks progress
    Giver,
    /// Takes the collected items and pays out
    TurnIn,
    /// Killing it may drop a quest item
    Monster(ItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropEntry {
    pub npc: NpcId,
    pub item: ItemId,
    pub count: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub currency: ItemId,
    pub amount: i64,
    pub repeatable: bool,
}

/// A fully resolved and validated quest definition
#[derive(Debug, Clone)]
pub struct QuestDefinition {
    pub id: QuestId,
    pub name: String,
    pub description: String,
    pub script: String,
    pub level_required: i32,
    pub start_npcs: Vec<NpcId>,
    pub talk_npcs: Vec<NpcId>,
    pub quest_items: Vec<ItemId>,
    pub giver: NpcId,
    pub turn_in: NpcId,
    pub drops: Vec<DropEntry>,
    pub reward: Reward,
    roles: HashMap<NpcId, NpcRole>,
}

impl QuestDefinition {
    pub fn from_toml_str(content: &str) -> std::result::Result<RawQuestFile, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve and validate raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self> {
        let id = raw.id;
        let start_npcs: Vec<NpcId> = raw.start_npcs.iter().copied().map(NpcId).collect();
        let talk_npcs: Vec<NpcId> = raw.talk_npcs.iter().copied().map(NpcId).collect();
        let quest_items: Vec<ItemId> = raw.quest_items.iter().copied().map(ItemId).collect();
        let giver = NpcId(raw.npcs.giver);
        let turn_in = NpcId(raw.npcs.turn_in);

        if !start_npcs.contains(&giver) {
            return Err(QuestError::invalid(id, format!("giver {} is not a start npc", giver)));
        }
        if !talk_npcs.contains(&giver) {
            return Err(QuestError::invalid(id, format!("giver {} is not a talk npc", giver)));
        }
        if !talk_npcs.contains(&turn_in) {
            return Err(QuestError::invalid(id, format!("turn-in {} is not a talk npc", turn_in)));
        }
        if raw.drops.is_empty() {
            return Err(QuestError::invalid(id, "quest has no drops"));
        }

        let mut roles = HashMap::new();
        roles.insert(giver, NpcRole::Giver);
        if roles.insert(turn_in, NpcRole::TurnIn).is_some() {
            return Err(QuestError::invalid(id, format!("npc {} has two roles", turn_in)));
        }

        let mut drops = Vec::with_capacity(raw.drops.len());
        for raw_drop in &raw.drops {
            let drop = DropEntry {
                npc: NpcId(raw_drop.npc),
                item: ItemId(raw_drop.item),
                count: raw_drop.count,
                max: raw_drop.max,
            };
            if !quest_items.contains(&drop.item) {
                return Err(QuestError::invalid(
                    id,
                    format!("drop item {} is not a quest item", drop.item),
                ));
            }
            if drop.count == 0 || drop.count > drop.max {
                return Err(QuestError::invalid(
                    id,
                    format!("drop from npc {} has count {} over max {}", drop.npc, drop.count, drop.max),
                ));
            }
            if drops.iter().any(|d: &DropEntry| d.item == drop.item) {
                return Err(QuestError::invalid(
                    id,
                    format!("item {} dropped by more than one npc", drop.item),
                ));
            }
            if roles.insert(drop.npc, NpcRole::Monster(drop.item)).is_some() {
                return Err(QuestError::invalid(id, format!("npc {} has two roles", drop.npc)));
            }
            drops.push(drop);
        }

        Ok(Self {
            id: QuestId(id),
            name: raw.name.clone(),
            description: raw.description.clone(),
            script: raw.script.clone(),
            level_required: raw.level_required,
            start_npcs,
            talk_npcs,
            quest_items,
            giver,
            turn_in,
            drops,
            reward: Reward {
                currency: ItemId(raw.rewards.currency),
                amount: raw.rewards.amount,
                repeatable: raw.rewards.repeatable,
            },
            roles,
        })
    }

    /// Parse and resolve a whole quest file
    pub fn parse(content: &str) -> Result<Self> {
        let raw = Self::from_toml_str(content).map_err(|source| QuestError::Parse {
            path: Default::default(),
            source,
        })?;
        Self::from_raw(&raw.quest)
    }

    pub fn role_of(&self, npc: NpcId) -> Option<NpcRole> {
        self.roles.get(&npc).copied()
    }

    /// NPCs whose death is reported to this quest
    pub fn kill_npcs(&self) -> impl Iterator<Item = NpcId> + '_ {
        self.drops.iter().map(|d| d.npc)
    }

    pub fn drop_for(&self, npc: NpcId) -> Option<&DropEntry> {
        self.drops.iter().find(|d| d.npc == npc)
    }

    pub fn is_start_npc(&self, npc: NpcId) -> bool {
        self.start_npcs.contains(&npc)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SCHUTTGART_TOML: &str =
        include_str!("../../data/quests/10280_mutated_kaneus_schuttgart.toml");

    pub(crate) fn schuttgart() -> QuestDefinition {
        QuestDefinition::parse(SCHUTTGART_TOML).unwrap()
    }

    #[test]
    fn test_schuttgart_definition() {
        let quest = schuttgart();
        assert_eq!(quest.id, QuestId(10280));
        assert_eq!(quest.name, "Mutated Kaneus - Schuttgart");
        assert_eq!(quest.level_required, 58);
        assert_eq!(quest.reward.amount, 210_000);
        assert_eq!(quest.reward.currency, ItemId(57));
        assert!(!quest.reward.repeatable);

        assert_eq!(quest.role_of(NpcId(31981)), Some(NpcRole::Giver));
        assert_eq!(quest.role_of(NpcId(31972)), Some(NpcRole::TurnIn));
        assert_eq!(quest.role_of(NpcId(18571)), Some(NpcRole::Monster(ItemId(13838))));
        assert_eq!(quest.role_of(NpcId(18573)), Some(NpcRole::Monster(ItemId(13839))));
        assert_eq!(quest.role_of(NpcId(1)), None);

        let kills: Vec<NpcId> = quest.kill_npcs().collect();
        assert_eq!(kills, vec![NpcId(18571), NpcId(18573)]);
    }

    #[test]
    fn test_drop_outside_whitelist_rejected() {
        let content = SCHUTTGART_TOML.replace("quest_items = [13838, 13839]", "quest_items = [13838]");
        let err = QuestDefinition::parse(&content).unwrap_err();
        assert!(matches!(err, QuestError::InvalidDefinition { quest_id: 10280, .. }));
    }

    #[test]
    fn test_giver_must_start_quest() {
        let content = SCHUTTGART_TOML.replace("start_npcs = [31981]", "start_npcs = []");
        assert!(QuestDefinition::parse(&content).is_err());
    }
}
