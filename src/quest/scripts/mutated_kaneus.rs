//! Mutated Kaneus quests
//!
//! The giver sends the player after mutated monsters; each one drops a single
//! tissue sample. With every sample in hand the player reports to the turn-in
//! NPC for a currency reward. Quest 10280 (Schuttgart) uses this script.

use tracing::{debug, info};

use crate::config::RateConfig;
use crate::quest::api::{QuestEffect, QuestHost, Sound};
use crate::quest::definition::{NpcId, NpcRole, QuestDefinition};
use crate::quest::party::pick_recipient;
use crate::quest::script::{page_name, Dialogue, QuestScript, ScriptResult, TalkContext};
use crate::quest::state::{QuestPhase, QuestState};

/// `cond` while the samples are being collected
const COND_COLLECTING: u8 = 1;

// Giver pages
const PAGE_TOO_LOW: u8 = 0;
const PAGE_OFFER: u8 = 1;
const PAGE_ACCEPT: u8 = 3;
const PAGE_IN_PROGRESS: u8 = 4;
const PAGE_READY: u8 = 5;
const PAGE_DONE: u8 = 6;

// Turn-in pages
const PAGE_NOT_YET: u8 = 1;
const PAGE_DELIVER: u8 = 2;
const PAGE_REWARD: u8 = 3;

pub struct MutatedKaneus {
    definition: QuestDefinition,
    rates: RateConfig,
    /// Branch token that accepts the quest
    accept_event: String,
    /// Branch token that hands in the samples
    turn_in_event: String,
}

impl MutatedKaneus {
    pub fn new(definition: QuestDefinition, rates: RateConfig) -> Self {
        let accept_event = page_name(definition.giver, PAGE_ACCEPT);
        let turn_in_event = page_name(definition.turn_in, PAGE_REWARD);
        Self {
            definition,
            rates,
            accept_event,
            turn_in_event,
        }
    }

    pub fn accept_event(&self) -> &str {
        &self.accept_event
    }

    pub fn turn_in_event(&self) -> &str {
        &self.turn_in_event
    }

    fn accept(&self, player_id: &str, event: &str, state: &mut QuestState) -> ScriptResult {
        match state.phase() {
            QuestPhase::Created => {
                state.start(COND_COLLECTING);
                info!("Player {} accepted quest {}", player_id, self.definition.id);
                ScriptResult::show(Dialogue::Page(event.to_string())).with_effect(QuestEffect::PlaySound {
                    player_id: player_id.to_string(),
                    sound: Sound::QuestAccept,
                })
            }
            QuestPhase::Started => ScriptResult::show(Dialogue::Page(event.to_string())),
            QuestPhase::Completed => ScriptResult::show(Dialogue::AlreadyCompleted),
        }
    }

    fn turn_in(&self, player_id: &str, event: &str, state: &mut QuestState) -> ScriptResult {
        match state.phase() {
            QuestPhase::Started => {
                let reward = self.definition.reward;
                let amount = self.rates.scale_currency(reward.amount);

                state.clear_cond();
                let removed = state.exit_quest(reward.repeatable);
                info!(
                    "Player {} completed quest {} for {} of item {}",
                    player_id, self.definition.id, amount, reward.currency
                );

                let mut result = ScriptResult::show(Dialogue::Page(event.to_string())).with_effect(
                    QuestEffect::RewardItems {
                        player_id: player_id.to_string(),
                        item: reward.currency,
                        amount,
                    },
                );
                if !removed.is_empty() {
                    result = result.with_effect(QuestEffect::QuestItemsRemoved {
                        player_id: player_id.to_string(),
                        quest_id: self.definition.id,
                        items: removed,
                    });
                }
                result.with_effect(QuestEffect::PlaySound {
                    player_id: player_id.to_string(),
                    sound: Sound::QuestFinish,
                })
            }
            QuestPhase::Completed => {
                debug!("Player {} repeated turn-in for quest {}", player_id, self.definition.id);
                ScriptResult::show(Dialogue::AlreadyCompleted)
            }
            QuestPhase::Created => ScriptResult::show(Dialogue::NoQuest),
        }
    }

    fn talk_giver(&self, ctx: &TalkContext<'_>) -> Dialogue {
        let giver = self.definition.giver;
        let phase = ctx.state.map_or(QuestPhase::Created, QuestState::phase);

        match (phase, ctx.state) {
            (QuestPhase::Completed, _) => Dialogue::page(giver, PAGE_DONE),
            (QuestPhase::Created, _) if ctx.player_level >= self.definition.level_required => {
                Dialogue::page(giver, PAGE_OFFER)
            }
            (QuestPhase::Created, _) => Dialogue::page(giver, PAGE_TOO_LOW),
            (QuestPhase::Started, Some(state)) if state.has_all_items() => {
                Dialogue::page(giver, PAGE_READY)
            }
            (QuestPhase::Started, Some(state)) if state.cond() == Some(COND_COLLECTING) => {
                Dialogue::page(giver, PAGE_IN_PROGRESS)
            }
            _ => Dialogue::NoQuest,
        }
    }

    fn talk_turn_in(&self, ctx: &TalkContext<'_>) -> Dialogue {
        let turn_in = self.definition.turn_in;
        match ctx.state {
            None => Dialogue::NoQuest,
            Some(state) if state.is_completed() => Dialogue::AlreadyCompleted,
            Some(state) if state.has_all_items() => Dialogue::page(turn_in, PAGE_DELIVER),
            Some(_) => Dialogue::page(turn_in, PAGE_NOT_YET),
        }
    }
}

impl QuestScript for MutatedKaneus {
    fn definition(&self) -> &QuestDefinition {
        &self.definition
    }

    /// Accept only applies to a `Created` quest and turn-in only to a `Started` one;
    /// any other phase gets a default message and no state change.
    fn on_event(&self, player_id: &str, event: &str, state: &mut QuestState) -> ScriptResult {
        if event == self.accept_event {
            self.accept(player_id, event, state)
        } else if event == self.turn_in_event {
            self.turn_in(player_id, event, state)
        } else {
            ScriptResult::show(Dialogue::Page(event.to_string()))
        }
    }

    fn on_talk(&self, npc: NpcId, ctx: &TalkContext<'_>) -> Dialogue {
        match self.definition.role_of(npc) {
            Some(NpcRole::Giver) => self.talk_giver(ctx),
            Some(NpcRole::TurnIn) => self.talk_turn_in(ctx),
            Some(NpcRole::Monster(_)) | None => Dialogue::NoQuest,
        }
    }

    fn on_kill(&self, npc: NpcId, killer_id: &str, host: &mut dyn QuestHost) -> ScriptResult {
        let Some(drop) = self.definition.drop_for(npc).copied() else {
            return ScriptResult::none();
        };
        let quest_id = self.definition.id;
        let missing = |state: &QuestState| state.item_count(drop.item) < drop.max;

        let recipient = pick_recipient(
            host,
            killer_id,
            quest_id,
            |state| state.is_started() && state.cond() == Some(COND_COLLECTING) && missing(state),
            |state| state.is_started() && missing(state),
        );
        let Some(winner) = recipient else {
            return ScriptResult::none();
        };

        let granted = host
            .quest_state_mut(&winner, quest_id)
            .map_or(0, |state| state.give_item(drop.item, drop.count, drop.max));
        if granted == 0 {
            return ScriptResult::none();
        }

        debug!(
            "Npc {} killed by {}: {} x{} to {}",
            npc, killer_id, drop.item, granted, winner
        );
        ScriptResult::none()
            .with_effect(QuestEffect::QuestItemGiven {
                player_id: winner.clone(),
                quest_id,
                item: drop.item,
                count: granted,
            })
            .with_effect(QuestEffect::PlaySound {
                player_id: winner,
                sound: Sound::ItemGet,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::tests::schuttgart;
    use crate::quest::definition::ItemId;
    use crate::session::PlayerSessions;

    const VISHOTSKY: NpcId = NpcId(31981);
    const ATRAXIA: NpcId = NpcId(31972);
    const VENOMOUS_STORACE: NpcId = NpcId(18571);
    const KEL_BILETTE: NpcId = NpcId(18573);
    const TISSUE_VS: ItemId = ItemId(13838);
    const TISSUE_KB: ItemId = ItemId(13839);

    fn script() -> MutatedKaneus {
        MutatedKaneus::new(schuttgart(), RateConfig::default())
    }

    fn talk(script: &MutatedKaneus, npc: NpcId, level: i32, state: Option<&QuestState>) -> Dialogue {
        script.on_talk(
            npc,
            &TalkContext {
                player_id: "alice",
                player_level: level,
                state,
            },
        )
    }

    fn fresh_state(script: &MutatedKaneus) -> QuestState {
        let definition = script.definition();
        QuestState::new(definition.id, &definition.quest_items)
    }

    fn started_state(script: &MutatedKaneus) -> QuestState {
        let mut state = fresh_state(script);
        state.start(COND_COLLECTING);
        state
    }

    fn page(token: &str) -> Option<Dialogue> {
        Some(Dialogue::Page(token.to_string()))
    }

    #[test]
    fn test_event_tokens() {
        let script = script();
        assert_eq!(script.accept_event(), "31981-03.htm");
        assert_eq!(script.turn_in_event(), "31972-03.htm");
    }

    #[test]
    fn test_accept_starts_quest_once() {
        let script = script();
        let mut state = fresh_state(&script);

        let result = script.on_event("alice", "31981-03.htm", &mut state);
        assert_eq!(result.dialogue, page("31981-03.htm"));
        assert_eq!(
            result.effects,
            vec![QuestEffect::PlaySound {
                player_id: "alice".to_string(),
                sound: Sound::QuestAccept,
            }]
        );
        assert_eq!(state.phase(), QuestPhase::Started);
        assert_eq!(state.cond(), Some(1));

        // Accepting again changes nothing
        state.give_item(TISSUE_VS, 1, 1);
        let again = script.on_event("alice", "31981-03.htm", &mut state);
        assert!(again.effects.is_empty());
        assert_eq!(state.item_count(TISSUE_VS), 1);
    }

    #[test]
    fn test_pass_through_tokens() {
        let script = script();
        let mut state = fresh_state(&script);
        let before = state.clone();

        let result = script.on_event("alice", "31981-02.htm", &mut state);
        assert_eq!(result.dialogue, page("31981-02.htm"));
        assert!(result.effects.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_turn_in_rewards_once() {
        let script = script();
        let mut state = started_state(&script);
        state.give_item(TISSUE_VS, 1, 1);
        state.give_item(TISSUE_KB, 1, 1);

        let result = script.on_event("alice", "31972-03.htm", &mut state);
        assert_eq!(result.dialogue, page("31972-03.htm"));
        assert_eq!(
            result.effects,
            vec![
                QuestEffect::RewardItems {
                    player_id: "alice".to_string(),
                    item: ItemId(57),
                    amount: 210_000,
                },
                QuestEffect::QuestItemsRemoved {
                    player_id: "alice".to_string(),
                    quest_id: script.definition().id,
                    items: vec![(TISSUE_VS, 1), (TISSUE_KB, 1)],
                },
                QuestEffect::PlaySound {
                    player_id: "alice".to_string(),
                    sound: Sound::QuestFinish,
                },
            ]
        );
        assert_eq!(state.phase(), QuestPhase::Completed);
        assert_eq!(state.cond(), None);
        assert_eq!(state.item_count(TISSUE_VS), 0);

        let again = script.on_event("alice", "31972-03.htm", &mut state);
        assert_eq!(again.dialogue, Some(Dialogue::AlreadyCompleted));
        assert!(again.effects.is_empty());

        // Completed quests cannot be re-accepted either
        let accept = script.on_event("alice", "31981-03.htm", &mut state);
        assert_eq!(accept.dialogue, Some(Dialogue::AlreadyCompleted));
        assert_eq!(state.phase(), QuestPhase::Completed);
    }

    #[test]
    fn test_turn_in_before_accept_is_noop() {
        let script = script();
        let mut state = fresh_state(&script);

        let result = script.on_event("alice", "31972-03.htm", &mut state);
        assert_eq!(result.dialogue, Some(Dialogue::NoQuest));
        assert!(result.effects.is_empty());
        assert_eq!(state.phase(), QuestPhase::Created);
    }

    #[test]
    fn test_reward_rate_applies() {
        let rates = RateConfig {
            quest_reward_currency: 2.0,
        };
        let script = MutatedKaneus::new(schuttgart(), rates);
        let mut state = started_state(&script);

        let result = script.on_event("alice", "31972-03.htm", &mut state);
        assert!(result.effects.contains(&QuestEffect::RewardItems {
            player_id: "alice".to_string(),
            item: ItemId(57),
            amount: 420_000,
        }));
    }

    #[test]
    fn test_giver_talk_table() {
        let script = script();

        assert_eq!(talk(&script, VISHOTSKY, 57, None), Dialogue::page(VISHOTSKY, 0));
        assert_eq!(talk(&script, VISHOTSKY, 58, None), Dialogue::page(VISHOTSKY, 1));

        let created = fresh_state(&script);
        assert_eq!(talk(&script, VISHOTSKY, 60, Some(&created)), Dialogue::page(VISHOTSKY, 1));

        let mut state = started_state(&script);
        assert_eq!(talk(&script, VISHOTSKY, 60, Some(&state)), Dialogue::page(VISHOTSKY, 4));

        state.give_item(TISSUE_VS, 1, 1);
        assert_eq!(talk(&script, VISHOTSKY, 60, Some(&state)), Dialogue::page(VISHOTSKY, 4));

        state.give_item(TISSUE_KB, 1, 1);
        assert_eq!(talk(&script, VISHOTSKY, 60, Some(&state)), Dialogue::page(VISHOTSKY, 5));

        state.exit_quest(false);
        assert_eq!(talk(&script, VISHOTSKY, 60, Some(&state)), Dialogue::page(VISHOTSKY, 6));
    }

    #[test]
    fn test_giver_without_matching_branch() {
        let script = script();
        let mut state = started_state(&script);
        state.set_cond(2);
        assert_eq!(talk(&script, VISHOTSKY, 60, Some(&state)), Dialogue::NoQuest);
    }

    #[test]
    fn test_turn_in_talk_table() {
        let script = script();
        assert_eq!(talk(&script, ATRAXIA, 60, None), Dialogue::NoQuest);

        let mut state = started_state(&script);
        assert_eq!(talk(&script, ATRAXIA, 60, Some(&state)), Dialogue::page(ATRAXIA, 1));

        state.give_item(TISSUE_VS, 1, 1);
        state.give_item(TISSUE_KB, 1, 1);
        assert_eq!(talk(&script, ATRAXIA, 60, Some(&state)), Dialogue::page(ATRAXIA, 2));

        state.exit_quest(false);
        assert_eq!(talk(&script, ATRAXIA, 60, Some(&state)), Dialogue::AlreadyCompleted);

        // Monsters have nothing to say
        assert_eq!(talk(&script, VENOMOUS_STORACE, 60, Some(&state)), Dialogue::NoQuest);
    }

    #[test]
    fn test_solo_kill_grants_once() {
        let script = script();
        let mut sessions = PlayerSessions::with_seed(1);
        sessions.join("alice", 60);
        sessions.insert_quest_state("alice", started_state(&script));

        let result = script.on_kill(VENOMOUS_STORACE, "alice", &mut sessions);
        assert_eq!(result.effects.len(), 2);
        assert_eq!(
            result.effects[0],
            QuestEffect::QuestItemGiven {
                player_id: "alice".to_string(),
                quest_id: script.definition().id,
                item: TISSUE_VS,
                count: 1,
            }
        );

        for _ in 0..5 {
            assert!(script.on_kill(VENOMOUS_STORACE, "alice", &mut sessions).is_noop());
        }

        let state = sessions.quest_state("alice", script.definition().id).unwrap();
        assert_eq!(state.item_count(TISSUE_VS), 1);
        assert_eq!(state.item_count(TISSUE_KB), 0);
        assert_eq!(state.phase(), QuestPhase::Started);
        assert_eq!(state.cond(), Some(1));
    }

    #[test]
    fn test_solo_kill_without_quest() {
        let script = script();
        let mut sessions = PlayerSessions::with_seed(1);
        sessions.join("alice", 60);

        assert!(script.on_kill(KEL_BILETTE, "alice", &mut sessions).is_noop());

        sessions.insert_quest_state("alice", fresh_state(&script));
        assert!(script.on_kill(KEL_BILETTE, "alice", &mut sessions).is_noop());

        // Not a quest monster
        sessions.quest_state_mut("alice", script.definition().id).unwrap().start(1);
        assert!(script.on_kill(NpcId(20001), "alice", &mut sessions).is_noop());
    }

    #[test]
    fn test_party_kill_second_monster_drops() {
        let script = script();
        let mut sessions = PlayerSessions::with_seed(5);
        sessions.join("alice", 60);
        sessions.join("bob", 60);
        sessions.form_party(&["alice", "bob"]);
        sessions.insert_quest_state("bob", started_state(&script));

        let result = script.on_kill(KEL_BILETTE, "alice", &mut sessions);
        assert_eq!(result.effects[0].player_id(), "bob");

        let bob = sessions.quest_state("bob", script.definition().id).unwrap();
        assert_eq!(bob.item_count(TISSUE_KB), 1);
        assert!(sessions.quest_state("alice", script.definition().id).is_none());

        // Bob is now full; nobody else qualifies
        assert!(script.on_kill(KEL_BILETTE, "alice", &mut sessions).is_noop());
    }

    #[test]
    fn test_party_members_need_collecting_cond() {
        let script = script();
        let mut sessions = PlayerSessions::with_seed(5);
        sessions.join("alice", 60);
        sessions.join("bob", 60);
        sessions.form_party(&["alice", "bob"]);

        let mut state = started_state(&script);
        state.set_cond(2);
        sessions.insert_quest_state("alice", state);

        assert!(script.on_kill(VENOMOUS_STORACE, "alice", &mut sessions).is_noop());
    }

    #[test]
    fn test_party_kills_never_exceed_cap() {
        let script = script();
        let mut sessions = PlayerSessions::with_seed(11);
        let names = ["alice", "bob", "carol"];
        for name in names {
            sessions.join(name, 60);
            sessions.insert_quest_state(name, started_state(&script));
        }
        sessions.form_party(&names);

        for _ in 0..30 {
            script.on_kill(VENOMOUS_STORACE, "carol", &mut sessions);
            script.on_kill(KEL_BILETTE, "alice", &mut sessions);
        }

        for name in names {
            let state = sessions.quest_state(name, script.definition().id).unwrap();
            assert_eq!(state.item_count(TISSUE_VS), 1);
            assert_eq!(state.item_count(TISSUE_KB), 1);
        }
    }
}
