//! Party Reward Arbitration
//!
//! Decides which player receives a quest drop for a kill. In a party every
//! eligible member has the same chance; a solo killer only needs to qualify.

use tracing::{debug, warn};

use super::api::QuestHost;
use super::definition::QuestId;
use super::state::QuestState;

/// Party members whose state for `quest_id` passes `eligible`, in party order
pub fn party_candidates<F>(
    host: &dyn QuestHost,
    members: &[String],
    quest_id: QuestId,
    eligible: F,
) -> Vec<String>
where
    F: Fn(&QuestState) -> bool,
{
    members
        .iter()
        .filter(|member| {
            host.quest_state(member, quest_id)
                .is_some_and(|state| eligible(state))
        })
        .cloned()
        .collect()
}

/// Pick the player who gets the drop for a kill by `killer_id`.
///
/// With a party, one member is drawn uniformly from those passing
/// `party_eligible`. Solo, the killer gets it if their state passes
/// `solo_eligible`. `None` means no drop.
pub fn pick_recipient<P, S>(
    host: &mut dyn QuestHost,
    killer_id: &str,
    quest_id: QuestId,
    party_eligible: P,
    solo_eligible: S,
) -> Option<String>
where
    P: Fn(&QuestState) -> bool,
    S: Fn(&QuestState) -> bool,
{
    match host.party_members(killer_id) {
        Some(members) => {
            let mut candidates = party_candidates(&*host, &members, quest_id, party_eligible);
            if candidates.is_empty() {
                debug!("No eligible party members of {} for quest {}", killer_id, quest_id);
                return None;
            }

            let roll = host.random(candidates.len());
            if roll >= candidates.len() {
                warn!("Host random returned {} for bound {}", roll, candidates.len());
                return None;
            }
            Some(candidates.swap_remove(roll))
        }
        None => {
            let state = host.quest_state(killer_id, quest_id)?;
            solo_eligible(state).then(|| killer_id.to_string())
        }
    }
}
