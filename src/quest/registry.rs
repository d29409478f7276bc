//! Quest Registry
//!
//! Loads quest definitions from TOML files, binds each to its script, and
//! routes host callbacks (talk, dialogue choice, kill) to the scripts that
//! registered for the NPC involved. Supports hot-reloading during development.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::RateConfig;
use crate::error::{QuestError, Result};

use super::api::QuestHost;
use super::definition::{NpcId, QuestDefinition, QuestId, RawQuestFile};
use super::events::QuestEvent;
use super::script::{Dialogue, QuestScript, ScriptResult, TalkContext};
use super::scripts::build_script;
use super::state::QuestState;

const RELOAD_DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(200);

/// Registered scripts plus the NPC lookups built from their definitions
#[derive(Default)]
struct QuestIndex {
    scripts: BTreeMap<QuestId, Arc<dyn QuestScript>>,
    /// NPCs that can hand out a quest
    start_npcs: HashMap<NpcId, Vec<QuestId>>,
    /// NPCs with quest dialogue
    talk_npcs: HashMap<NpcId, Vec<QuestId>>,
    /// NPCs whose death is reported to a quest
    kill_npcs: HashMap<NpcId, Vec<QuestId>>,
}

impl QuestIndex {
    fn register(&mut self, script: Arc<dyn QuestScript>) {
        let definition = script.definition();
        let quest_id = definition.id;

        if self.scripts.contains_key(&quest_id) {
            warn!("Duplicate quest ID {}, overwriting", quest_id);
            self.unregister(quest_id);
        }

        for &npc in &definition.start_npcs {
            add_unique(self.start_npcs.entry(npc).or_default(), quest_id);
        }
        for &npc in &definition.talk_npcs {
            add_unique(self.talk_npcs.entry(npc).or_default(), quest_id);
        }
        for npc in definition.kill_npcs() {
            add_unique(self.kill_npcs.entry(npc).or_default(), quest_id);
        }

        self.scripts.insert(quest_id, script);
    }

    fn unregister(&mut self, quest_id: QuestId) {
        self.scripts.remove(&quest_id);
        for table in [&mut self.start_npcs, &mut self.talk_npcs, &mut self.kill_npcs] {
            table.retain(|_, quests| {
                quests.retain(|id| *id != quest_id);
                !quests.is_empty()
            });
        }
    }

    fn scripts_for(&self, table: &HashMap<NpcId, Vec<QuestId>>, npc: NpcId) -> Vec<Arc<dyn QuestScript>> {
        table
            .get(&npc)
            .map(|ids| ids.iter().filter_map(|id| self.scripts.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}

/// Keeps quest ids sorted so dispatch order is stable
fn add_unique(quests: &mut Vec<QuestId>, quest_id: QuestId) {
    if let Err(pos) = quests.binary_search(&quest_id) {
        quests.insert(pos, quest_id);
    }
}

/// Registry for all quest scripts
pub struct QuestRegistry {
    index: RwLock<QuestIndex>,
    /// Base directory for quest data
    data_dir: PathBuf,
    rates: RateConfig,
}

impl QuestRegistry {
    pub fn new(data_dir: &Path, rates: RateConfig) -> Self {
        Self {
            index: RwLock::new(QuestIndex::default()),
            data_dir: data_dir.join("quests"),
            rates,
        }
    }

    /// Load all quest definitions from the data directory, replacing
    /// whatever was loaded before. Broken files are logged and skipped.
    pub async fn load_all(&self) -> Result<usize> {
        info!("Loading quests from {:?}", self.data_dir);

        if !self.data_dir.exists() {
            warn!("Quest directory does not exist: {:?}", self.data_dir);
            return Ok(0);
        }

        let mut paths = Vec::new();
        collect_quest_files(&self.data_dir, &mut paths)?;
        paths.sort();

        let mut index = QuestIndex::default();
        for path in paths {
            match self.load_quest_file(&path) {
                Ok(script) => {
                    let definition = script.definition();
                    info!("Loaded quest: {} ({})", definition.name, definition.id);
                    index.register(script);
                }
                Err(e) => warn!("Failed to load quest {:?}: {}", path, e),
            }
        }

        let quest_count = index.scripts.len();
        *self.index.write().await = index;
        info!("Loaded {} quest definitions", quest_count);

        Ok(quest_count)
    }

    /// Load a single quest file and build its script
    fn load_quest_file(&self, path: &Path) -> Result<Arc<dyn QuestScript>> {
        let content = std::fs::read_to_string(path).map_err(|source| QuestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawQuestFile = QuestDefinition::from_toml_str(&content).map_err(|source| QuestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let definition = QuestDefinition::from_raw(&raw.quest)?;
        build_script(definition, self.rates)
    }

    /// Register a script directly (for hosts that build quests in code)
    pub async fn register(&self, script: Arc<dyn QuestScript>) {
        self.index.write().await.register(script);
    }

    /// Get a quest script by ID
    pub async fn get(&self, quest_id: QuestId) -> Option<Arc<dyn QuestScript>> {
        self.index.read().await.scripts.get(&quest_id).cloned()
    }

    /// Get all quest IDs, ascending
    pub async fn all_ids(&self) -> Vec<QuestId> {
        self.index.read().await.scripts.keys().copied().collect()
    }

    /// Get count of loaded quests
    pub async fn count(&self) -> usize {
        self.index.read().await.scripts.len()
    }

    /// Quests this NPC can start
    pub async fn quests_started_by(&self, npc: NpcId) -> Vec<QuestId> {
        self.index.read().await.start_npcs.get(&npc).cloned().unwrap_or_default()
    }

    /// Quests that react to this NPC's death
    pub async fn quests_killed_by(&self, npc: NpcId) -> Vec<QuestId> {
        self.index.read().await.kill_npcs.get(&npc).cloned().unwrap_or_default()
    }

    /// Player talked to an NPC: pick the dialogue to show.
    ///
    /// Quests are asked in id order and the first quest page wins. A player
    /// with no state only gets an answer from a start NPC; the state is
    /// created there once the player meets the level requirement.
    pub async fn talk(&self, host: &mut dyn QuestHost, player_id: &str, npc: NpcId) -> Dialogue {
        let scripts = {
            let index = self.index.read().await;
            index.scripts_for(&index.talk_npcs, npc)
        };
        if scripts.is_empty() {
            debug!("NPC {} has no quests", npc);
            return Dialogue::NoQuest;
        }

        let Some(player_level) = host.player_level(player_id) else {
            warn!("Talk from unknown player {}", player_id);
            return Dialogue::NoQuest;
        };

        let mut fallback = Dialogue::NoQuest;
        for script in scripts {
            let definition = script.definition();
            let state = host.quest_state(player_id, definition.id);
            let has_state = state.is_some();
            if !has_state && !definition.is_start_npc(npc) {
                continue;
            }

            let dialogue = script.on_talk(
                npc,
                &TalkContext {
                    player_id,
                    player_level,
                    state,
                },
            );

            if !has_state && player_level >= definition.level_required {
                host.insert_quest_state(player_id, QuestState::new(definition.id, &definition.quest_items));
                debug!("Created quest {} state for player {}", definition.id, player_id);
            }

            if !dialogue.is_default() {
                return dialogue;
            }
            if fallback == Dialogue::NoQuest {
                fallback = dialogue;
            }
        }

        fallback
    }

    /// Player picked a branch token in a quest dialogue.
    /// `None` when the quest is unknown or the player has no state for it.
    pub async fn event(
        &self,
        host: &mut dyn QuestHost,
        player_id: &str,
        quest_id: QuestId,
        token: &str,
    ) -> Option<ScriptResult> {
        let Some(script) = self.get(quest_id).await else {
            warn!("Event '{}' for unknown quest {}", token, quest_id);
            return None;
        };
        let Some(state) = host.quest_state_mut(player_id, quest_id) else {
            debug!("Player {} has no state for quest {}", player_id, quest_id);
            return None;
        };

        let result = script.on_event(player_id, token, state);
        apply_effects(host, &result);
        Some(result)
    }

    /// An NPC died: let every quest registered for it decide on drops
    pub async fn kill(&self, host: &mut dyn QuestHost, killer_id: &str, npc: NpcId) -> Vec<(QuestId, ScriptResult)> {
        let scripts = {
            let index = self.index.read().await;
            index.scripts_for(&index.kill_npcs, npc)
        };

        let mut results = Vec::new();
        for script in scripts {
            let result = script.on_kill(npc, killer_id, host);
            if result.is_noop() {
                continue;
            }
            apply_effects(host, &result);
            results.push((script.definition().id, result));
        }
        results
    }

    /// Process a quest event and return what to show plus applied effects
    pub async fn process_event(&self, host: &mut dyn QuestHost, event: &QuestEvent) -> ScriptResult {
        debug!("Processing {} for {}", event.event_type(), event.player_id());

        match event {
            QuestEvent::NpcTalk { player_id, npc_id } => {
                ScriptResult::show(self.talk(host, player_id, *npc_id).await)
            }
            QuestEvent::DialogueChoice {
                player_id,
                quest_id,
                token,
            } => self
                .event(host, player_id, *quest_id, token)
                .await
                .unwrap_or_else(|| ScriptResult::show(Dialogue::NoQuest)),
            QuestEvent::NpcKilled { player_id, npc_id } => {
                let mut merged = ScriptResult::none();
                for (_, result) in self.kill(host, player_id, *npc_id).await {
                    merged.effects.extend(result.effects);
                }
                merged
            }
        }
    }

    /// Start file watcher for hot-reload.
    /// Returns a channel receiver that signals when reloads occur.
    ///
    /// Reloads run one at a time on a single task; changes that arrive while
    /// a reload is pending are folded into it.
    pub fn start_file_watcher(self: &Arc<Self>) -> Result<tokio::sync::mpsc::Receiver<HotReloadEvent>> {
        use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
        use std::time::Duration;

        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let (reload_tx, mut reload_rx) = tokio::sync::mpsc::unbounded_channel::<PathBuf>();
        let registry = Arc::clone(self);
        let data_dir = self.data_dir.clone();

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;
        if data_dir.exists() {
            watcher.watch(&data_dir, RecursiveMode::Recursive)?;
        }
        info!("Quest hot-reload watcher started for {:?}", data_dir);

        // notify is sync; the watcher lives on this thread until the reload task is gone
        std::thread::spawn(move || {
            let _watcher = watcher;
            while let Ok(event) = notify_rx.recv() {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)) {
                    continue;
                }
                let Some(path) = event
                    .paths
                    .iter()
                    .find(|p| p.extension().is_some_and(|ext| ext == "toml"))
                    .cloned()
                else {
                    continue;
                };

                debug!("Detected change in {:?}", path);
                if reload_tx.send(path).is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(mut path) = reload_rx.recv().await {
                // Editors write in bursts; let them settle
                tokio::time::sleep(RELOAD_DEBOUNCE).await;
                while let Ok(next) = reload_rx.try_recv() {
                    path = next;
                }

                info!("Reloading quests after change in {:?}", path);
                let event = match registry.load_all().await {
                    Ok(count) => {
                        info!("Hot-reload completed: {} quests", count);
                        HotReloadEvent::Reloaded(path.to_string_lossy().to_string())
                    }
                    Err(e) => {
                        tracing::error!("Hot-reload failed: {}", e);
                        HotReloadEvent::Error(e.to_string())
                    }
                };
                let _ = tx.send(event).await;
            }
        });

        Ok(rx)
    }
}

fn collect_quest_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| QuestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let path = entry
            .map_err(|source| QuestError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        if path.is_dir() {
            collect_quest_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

fn apply_effects(host: &mut dyn QuestHost, result: &ScriptResult) {
    for effect in &result.effects {
        host.apply_effect(effect);
    }
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    /// A file change was picked up and all quests reloaded
    Reloaded(String),
    /// An error occurred during reload
    Error(String),
}
