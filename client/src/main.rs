use anyhow::Context;
use chatlist_client::{init_tracing, ClientConfig, ClientState, MemoryDocumentStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::from_env()?;
    let store = MemoryDocumentStore::new();
    if let Some(path) = &config.fixture_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let fixture: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        let documents = store.seed_from_json(&fixture)?;
        info!(documents, fixture = %path.display(), "store seeded");
    }

    let state = ClientState::new(config, Arc::new(store));
    info!(session = %state.session_id(), "starting chat list client");
    if state.config().user_id.is_none() {
        warn!("CHATLIST_USER_ID not set, chat list stays empty");
    }

    let mut screen = state.mount_chat_list()?;
    screen.settle().await;
    for line in screen.view().lines() {
        println!("{line}");
    }
    screen.dismiss();
    Ok(())
}
