pub mod chats;
pub mod config;
pub mod state;
pub mod store;

pub use chats::{
    ChatListScreen, ChatListView, ChatRow, ChatSelection, ChatSummarySubscription,
    RecipientNameResolver,
};
pub use config::ClientConfig;
pub use state::ClientState;
pub use store::{DocumentStore, MemoryDocumentStore, StoreError, StoreResult};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
