use std::sync::Arc;
use tracing::{error, info, warn};

use quest_scripts::quest::{HotReloadEvent, QuestRegistry};
use quest_scripts::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quest_scripts=info".parse().unwrap()),
        )
        .init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    // Load quest registry from TOML files
    let quest_registry = Arc::new(QuestRegistry::new(&config.data_dir, config.rates));
    if let Err(e) = quest_registry.load_all().await {
        error!("Failed to load quest registry: {}", e);
        std::process::exit(1);
    }

    for quest_id in quest_registry.all_ids().await {
        if let Some(script) = quest_registry.get(quest_id).await {
            let definition = script.definition();
            info!(
                "Quest {} '{}': script={} level>={} start={:?} kills={:?}",
                definition.id,
                definition.name,
                definition.script,
                definition.level_required,
                definition.start_npcs,
                definition.kill_npcs().collect::<Vec<_>>()
            );
        }
    }

    if !config.hot_reload {
        return;
    }

    // Watch quest files until interrupted
    match quest_registry.start_file_watcher() {
        Ok(mut rx) => {
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        HotReloadEvent::Reloaded(path) => info!("Quest data reloaded: {}", path),
                        HotReloadEvent::Error(e) => warn!("Quest reload error: {}", e),
                    }
                }
            });
        }
        Err(e) => {
            error!("Failed to start quest file watcher: {}", e);
            return;
        }
    }

    info!("Watching {:?} for quest changes, Ctrl-C to exit", config.quests_dir());
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
