use crate::chats::ChatListScreen;
use crate::config::ClientConfig;
use crate::store::DocumentStore;
use std::sync::Arc;

pub struct ClientState {
    config: ClientConfig,
    store: Arc<dyn DocumentStore>,
}

impl ClientState {
    pub fn new(config: ClientConfig, store: Arc<dyn DocumentStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Mounts the chat list for the user the client was configured with.
    pub fn mount_chat_list(&self) -> crate::store::StoreResult<ChatListScreen> {
        ChatListScreen::mount(
            self.store(),
            self.config.clone(),
            self.config.user_id.clone(),
        )
    }
}
