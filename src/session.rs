//! In-memory player sessions
//!
//! A self-contained [`QuestHost`] holding players, parties, inventories and
//! quest states. The binary uses it for dry runs and the tests use it as the
//! game host.

use std::collections::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::quest::{ItemId, PlayerQuestState, QuestEffect, QuestHost, QuestId, QuestState, Sound};

/// One connected player
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub player_id: String,
    pub level: i32,
    pub party_id: Option<u32>,
    pub quests: PlayerQuestState,
    pub inventory: HashMap<ItemId, i64>,
    /// Sounds played to this player, oldest first
    pub sounds: Vec<Sound>,
}

impl PlayerSession {
    fn new(player_id: &str, level: i32) -> Self {
        Self {
            player_id: player_id.to_string(),
            level,
            party_id: None,
            quests: PlayerQuestState::new(),
            inventory: HashMap::new(),
            sounds: Vec::new(),
        }
    }
}

pub struct PlayerSessions {
    players: HashMap<String, PlayerSession>,
    parties: HashMap<u32, Vec<String>>,
    next_party_id: u32,
    rng: StdRng,
    /// Every effect applied, in order
    effect_log: Vec<QuestEffect>,
}

impl PlayerSessions {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic drops for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            players: HashMap::new(),
            parties: HashMap::new(),
            next_party_id: 1,
            rng,
            effect_log: Vec::new(),
        }
    }

    /// Add a player (or update the level of an existing one)
    pub fn join(&mut self, player_id: &str, level: i32) -> &mut PlayerSession {
        let session = self
            .players
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerSession::new(player_id, level));
        session.level = level;
        session
    }

    pub fn leave(&mut self, player_id: &str) -> Option<PlayerSession> {
        self.leave_party(player_id);
        self.players.remove(player_id)
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerSession> {
        self.players.get(player_id)
    }

    /// Group players into a new party; unknown ids are skipped and players
    /// already in a party leave it first
    pub fn form_party(&mut self, player_ids: &[&str]) -> Option<u32> {
        let known: Vec<String> = player_ids
            .iter()
            .filter(|id| self.players.contains_key(**id))
            .map(|id| id.to_string())
            .collect();
        if known.len() < 2 {
            warn!("Cannot form a party from {:?}", player_ids);
            return None;
        }

        for id in &known {
            self.leave_party(id);
        }

        let party_id = self.next_party_id;
        self.next_party_id += 1;
        for id in &known {
            if let Some(session) = self.players.get_mut(id) {
                session.party_id = Some(party_id);
            }
        }
        debug!("Formed party {} with {:?}", party_id, known);
        self.parties.insert(party_id, known);
        Some(party_id)
    }

    /// Remove a player from their party; a party left with one member disbands
    pub fn leave_party(&mut self, player_id: &str) {
        let Some(party_id) = self.players.get_mut(player_id).and_then(|s| s.party_id.take()) else {
            return;
        };
        let Some(members) = self.parties.get_mut(&party_id) else {
            return;
        };
        members.retain(|id| id != player_id);
        if members.len() < 2 {
            for id in members.drain(..) {
                if let Some(session) = self.players.get_mut(&id) {
                    session.party_id = None;
                }
            }
            self.parties.remove(&party_id);
            debug!("Party {} disbanded", party_id);
        }
    }

    pub fn inventory_count(&self, player_id: &str, item: ItemId) -> i64 {
        self.players
            .get(player_id)
            .and_then(|s| s.inventory.get(&item).copied())
            .unwrap_or(0)
    }

    pub fn effect_log(&self) -> &[QuestEffect] {
        &self.effect_log
    }
}

impl Default for PlayerSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestHost for PlayerSessions {
    fn player_level(&self, player_id: &str) -> Option<i32> {
        self.players.get(player_id).map(|s| s.level)
    }

    fn party_members(&self, player_id: &str) -> Option<Vec<String>> {
        let party_id = self.players.get(player_id)?.party_id?;
        self.parties.get(&party_id).cloned()
    }

    fn quest_state(&self, player_id: &str, quest_id: QuestId) -> Option<&QuestState> {
        self.players.get(player_id)?.quests.get(quest_id)
    }

    fn quest_state_mut(&mut self, player_id: &str, quest_id: QuestId) -> Option<&mut QuestState> {
        self.players.get_mut(player_id)?.quests.get_mut(quest_id)
    }

    fn insert_quest_state(&mut self, player_id: &str, state: QuestState) -> Option<&mut QuestState> {
        let session = self.players.get_mut(player_id)?;
        Some(session.quests.insert(state))
    }

    fn random(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    fn apply_effect(&mut self, effect: &QuestEffect) {
        let Some(session) = self.players.get_mut(effect.player_id()) else {
            warn!("Dropping {} for offline player {}", effect.effect_type(), effect.player_id());
            return;
        };

        match effect {
            QuestEffect::PlaySound { sound, .. } => session.sounds.push(*sound),
            QuestEffect::QuestItemGiven { item, count, .. } => {
                *session.inventory.entry(*item).or_insert(0) += i64::from(*count);
            }
            QuestEffect::QuestItemsRemoved { items, .. } => {
                for (item, count) in items {
                    if let Some(held) = session.inventory.get_mut(item) {
                        *held = (*held - i64::from(*count)).max(0);
                        if *held == 0 {
                            session.inventory.remove(item);
                        }
                    }
                }
            }
            QuestEffect::RewardItems { item, amount, .. } => {
                *session.inventory.entry(*item).or_insert(0) += *amount;
            }
        }
        self.effect_log.push(effect.clone());
    }
}
