use chatlist_model::{DocumentPath, UserId};
use std::env;
use std::path::PathBuf;
use uuid::Uuid;

/// Runtime configuration for the chat-list client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Collection holding one aggregate chat document per user.
    pub chats_collection: String,
    /// Collection holding the per-user directory records.
    pub users_collection: String,
    /// Maximum directory lookups in flight per batch.
    pub lookup_concurrency: usize,
    /// Signed-in user, when known at startup.
    pub user_id: Option<UserId>,
    /// JSON file used to seed the in-memory store.
    pub fixture_path: Option<PathBuf>,
    pub session_id: String,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let chats_collection =
            env::var("CHATLIST_CHATS_COLLECTION").unwrap_or(defaults.chats_collection);
        let users_collection =
            env::var("CHATLIST_USERS_COLLECTION").unwrap_or(defaults.users_collection);
        let lookup_concurrency = env::var("CHATLIST_LOOKUP_CONCURRENCY")
            .ok()
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(defaults.lookup_concurrency)
            .max(1);
        let user_id = env::var("CHATLIST_USER_ID").ok().and_then(UserId::parse);
        let fixture_path = env::var_os("CHATLIST_FIXTURE").map(PathBuf::from);
        let session_id = env::var("CHATLIST_SESSION_ID").unwrap_or(defaults.session_id);
        Ok(Self {
            chats_collection,
            users_collection,
            lookup_concurrency,
            user_id,
            fixture_path,
            session_id,
        })
    }

    pub fn with_user(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }

    pub fn with_lookup_concurrency(mut self, limit: usize) -> Self {
        self.lookup_concurrency = limit.max(1);
        self
    }

    pub fn with_collections(
        mut self,
        chats: impl Into<String>,
        users: impl Into<String>,
    ) -> Self {
        self.chats_collection = chats.into();
        self.users_collection = users.into();
        self
    }

    /// Aggregate chat document of `user`.
    pub fn chats_path(&self, user: &UserId) -> DocumentPath {
        DocumentPath::new(&self.chats_collection, user.as_str())
    }

    /// Directory record of `uid`.
    pub fn user_path(&self, uid: &str) -> DocumentPath {
        DocumentPath::new(&self.users_collection, uid)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chats_collection: "userChats".to_string(),
            users_collection: "users".to_string(),
            lookup_concurrency: 8,
            user_id: None,
            fixture_path: None,
            session_id: Uuid::new_v4().to_string(),
        }
    }
}
