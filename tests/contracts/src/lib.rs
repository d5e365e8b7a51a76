//! Test doubles shared by the ChatList contract tests.

use async_trait::async_trait;
use chatlist_client::store::{ListenerRegistration, SnapshotEvent};
use chatlist_client::{ClientConfig, DocumentStore, MemoryDocumentStore, StoreError, StoreResult};
use chatlist_model::{DocumentPath, DocumentSnapshot, UserId};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Notify};

/// Directory backed by a [`MemoryDocumentStore`] that logs every user lookup
/// and can hold individual lookups until released.
#[derive(Clone)]
pub struct ScriptedDirectory {
    store: MemoryDocumentStore,
    config: ClientConfig,
    gates: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDirectory {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            store: MemoryDocumentStore::new(),
            config,
            gates: Arc::default(),
            lookups: Arc::default(),
        }
    }

    pub fn store(&self) -> &MemoryDocumentStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn add_user(&self, uid: &str, display_name: &str) {
        self.store.set_document(
            self.config.user_path(uid),
            json!({ "displayName": display_name }),
        );
    }

    pub fn fail_user(&self, uid: &str, error: StoreError) {
        self.store.fail_reads(self.config.user_path(uid), error);
    }

    /// Replaces `user`'s aggregate chat document.
    pub fn publish_chats(&self, user: &UserId, data: Value) {
        self.store.set_document(self.config.chats_path(user), data);
    }

    pub fn chats_path(&self, user: &UserId) -> DocumentPath {
        self.config.chats_path(user)
    }

    /// Lookups for `uid` block until [`release`](Self::release).
    pub fn hold(&self, uid: &str) {
        lock(&self.gates).insert(uid.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, uid: &str) {
        if let Some(gate) = lock(&self.gates).remove(uid) {
            gate.notify_one();
        }
    }

    pub fn lookups_for(&self, uid: &str) -> usize {
        lock(&self.lookups).iter().filter(|seen| *seen == uid).count()
    }

    pub fn total_lookups(&self) -> usize {
        lock(&self.lookups).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DocumentStore for ScriptedDirectory {
    fn subscribe(
        &self,
        path: &DocumentPath,
        sink: mpsc::UnboundedSender<SnapshotEvent>,
    ) -> StoreResult<ListenerRegistration> {
        self.store.subscribe(path, sink)
    }

    async fn get_document(&self, path: &DocumentPath) -> StoreResult<DocumentSnapshot> {
        let gate = if path.collection == self.config.users_collection {
            lock(&self.lookups).push(path.document_id.clone());
            lock(&self.gates).get(&path.document_id).cloned()
        } else {
            None
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.store.get_document(path).await
    }
}

/// Aggregate chat document with one chat per `(chat id, uid, last message, timestamp)`.
pub fn chats_document(chats: &[(&str, &str, &str, i64)]) -> Value {
    let chats: Vec<Value> = chats
        .iter()
        .map(|(chat_id, uid, last_message, timestamp)| {
            json!({
                "chatId": chat_id,
                "userInfo": { "uid": uid },
                "lastMessage": last_message,
                "timestamp": timestamp
            })
        })
        .collect();
    json!({ "chats": chats })
}

pub fn user(uid: &str) -> UserId {
    UserId::parse(uid).expect("test uid must not be blank")
}

/// Yields to the runtime until `condition` holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
