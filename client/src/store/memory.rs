//! In-process document store with live listeners, read counters and
//! injectable read failures.

use super::{DocumentStore, ListenerRegistration, SnapshotEvent, StoreError, StoreResult};
use async_trait::async_trait;
use chatlist_model::{DocumentPath, DocumentSnapshot};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

type Listener = (Uuid, mpsc::UnboundedSender<SnapshotEvent>);

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<DocumentPath, Value>,
    listeners: HashMap<DocumentPath, Vec<Listener>>,
    reads: HashMap<DocumentPath, usize>,
    failures: HashMap<DocumentPath, StoreError>,
}

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }

    /// Writes a whole document and notifies its listeners.
    pub fn set_document(&self, path: DocumentPath, data: Value) {
        let mut state = self.state();
        state.documents.insert(path.clone(), data.clone());
        let snapshot = DocumentSnapshot::new(path, Some(data));
        notify(&mut state, &snapshot);
    }

    pub fn delete_document(&self, path: &DocumentPath) {
        let mut state = self.state();
        if state.documents.remove(path).is_some() {
            notify(&mut state, &DocumentSnapshot::missing(path.clone()));
        }
    }

    /// Loads `{ "<collection>": { "<document id>": <data> } }`. Returns the
    /// number of documents written.
    pub fn seed_from_json(&self, fixture: &Value) -> StoreResult<usize> {
        let collections = fixture
            .as_object()
            .ok_or_else(|| StoreError::InvalidData("fixture root must be an object".into()))?;

        let mut written = 0;
        for (collection, documents) in collections {
            let documents = documents.as_object().ok_or_else(|| {
                StoreError::InvalidData(format!("collection {collection} must be an object"))
            })?;
            for (id, data) in documents {
                self.set_document(DocumentPath::new(collection, id), data.clone());
                written += 1;
            }
        }
        debug!(written, "seeded memory store");
        Ok(written)
    }

    /// Makes every subsequent read of `path` fail with `error`.
    pub fn fail_reads(&self, path: DocumentPath, error: StoreError) {
        self.state().failures.insert(path, error);
    }

    pub fn clear_failure(&self, path: &DocumentPath) {
        self.state().failures.remove(path);
    }

    /// One-shot reads issued against `path`, including failed ones.
    pub fn read_count(&self, path: &DocumentPath) -> usize {
        self.state().reads.get(path).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.state().reads.values().sum()
    }

    pub fn listener_count(&self, path: &DocumentPath) -> usize {
        self.state().listeners.get(path).map_or(0, Vec::len)
    }

    /// Delivers a terminal error to every listener on `path` and drops them.
    pub fn close_listeners(&self, path: &DocumentPath, error: StoreError) {
        let listeners = self.state().listeners.remove(path).unwrap_or_default();
        for (_, sink) in listeners {
            let _ = sink.send(Err(error.clone()));
        }
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn notify(state: &mut MemoryState, snapshot: &DocumentSnapshot) {
    if let Some(listeners) = state.listeners.get_mut(&snapshot.path) {
        listeners.retain(|(_, sink)| sink.send(Ok(snapshot.clone())).is_ok());
    }
}

fn release_listener(state: &Weak<Mutex<MemoryState>>, path: &DocumentPath, id: Uuid) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock(&state);
    if let Some(listeners) = state.listeners.get_mut(path) {
        listeners.retain(|(listener_id, _)| *listener_id != id);
        if listeners.is_empty() {
            state.listeners.remove(path);
        }
    }
    debug!(%path, %id, "listener released");
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn subscribe(
        &self,
        path: &DocumentPath,
        sink: mpsc::UnboundedSender<SnapshotEvent>,
    ) -> StoreResult<ListenerRegistration> {
        let id = Uuid::new_v4();
        {
            let mut state = self.state();
            let current = DocumentSnapshot::new(path.clone(), state.documents.get(path).cloned());
            sink.send(Ok(current)).map_err(|_| StoreError::Closed)?;
            state
                .listeners
                .entry(path.clone())
                .or_default()
                .push((id, sink));
        }
        debug!(%path, %id, "listener registered");

        let weak = Arc::downgrade(&self.state);
        let path = path.clone();
        Ok(ListenerRegistration::new(id, move || {
            release_listener(&weak, &path, id)
        }))
    }

    async fn get_document(&self, path: &DocumentPath) -> StoreResult<DocumentSnapshot> {
        let mut state = self.state();
        *state.reads.entry(path.clone()).or_default() += 1;
        if let Some(error) = state.failures.get(path) {
            return Err(error.clone());
        }
        Ok(DocumentSnapshot::new(
            path.clone(),
            state.documents.get(path).cloned(),
        ))
    }
}
