use crate::config::ClientConfig;
use crate::store::DocumentStore;
use chatlist_model::{distinct_recipients, ChatSummary, RecipientName, UserDirectoryEntry};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// uid -> name for every counterpart looked up so far.
pub type NameMap = Arc<HashMap<String, RecipientName>>;

#[derive(Default)]
struct ResolverState {
    names: HashMap<String, RecipientName>,
    pending: HashSet<String>,
    closed: bool,
}

struct ResolverInner {
    store: Arc<dyn DocumentStore>,
    config: ClientConfig,
    state: Mutex<ResolverState>,
    names_tx: watch::Sender<NameMap>,
    lookups: AtomicUsize,
}

/// Resolves counterpart uids to display names, at most once per uid.
///
/// Each call to [`resolve`](Self::resolve) starts one batch. Lookups inside a
/// batch run concurrently; the batch lands in the cache as a single merge.
/// The cache only grows.
pub struct RecipientNameResolver {
    inner: Arc<ResolverInner>,
    batches: Mutex<Vec<JoinHandle<()>>>,
}

impl RecipientNameResolver {
    pub fn new(store: Arc<dyn DocumentStore>, config: ClientConfig) -> Self {
        let (names_tx, _) = watch::channel(NameMap::default());
        Self {
            inner: Arc::new(ResolverInner {
                store,
                config,
                state: Mutex::new(ResolverState::default()),
                names_tx,
                lookups: AtomicUsize::new(0),
            }),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Schedules lookups for every uid in `chats` that is neither cached nor
    /// already in flight. Returns how many were scheduled.
    pub fn resolve(&self, chats: &[ChatSummary]) -> usize {
        let uids: Vec<String> = {
            let mut state = self.inner.state();
            if state.closed {
                return 0;
            }
            let fresh: Vec<String> = distinct_recipients(chats)
                .into_iter()
                .filter(|uid| !state.names.contains_key(uid) && !state.pending.contains(uid))
                .collect();
            state.pending.extend(fresh.iter().cloned());
            fresh
        };
        if uids.is_empty() {
            return 0;
        }

        let scheduled = uids.len();
        debug!(scheduled, "resolving recipient names");
        let batch = tokio::spawn(run_batch(Arc::clone(&self.inner), uids));
        let mut batches = self.batches();
        batches.retain(|handle| !handle.is_finished());
        batches.push(batch);
        scheduled
    }

    /// Name to show for `uid`; `Loading` until its lookup has landed.
    pub fn name_for(&self, uid: &str) -> RecipientName {
        self.inner
            .state()
            .names
            .get(uid)
            .cloned()
            .unwrap_or(RecipientName::Loading)
    }

    pub fn names(&self) -> NameMap {
        self.inner.names_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<NameMap> {
        self.inner.names_tx.subscribe()
    }

    pub fn is_pending(&self, uid: &str) -> bool {
        self.inner.state().pending.contains(uid)
    }

    /// Directory reads issued since creation.
    pub fn lookups_issued(&self) -> usize {
        self.inner.lookups.load(Ordering::SeqCst)
    }

    /// Waits for every batch scheduled so far, and any scheduled meanwhile.
    pub async fn wait_idle(&self) {
        loop {
            let batches = std::mem::take(&mut *self.batches());
            if batches.is_empty() {
                return;
            }
            for batch in batches {
                let _ = batch.await;
            }
        }
    }

    /// Stops accepting work and abandons in-flight batches. Results that still
    /// arrive are dropped.
    pub fn shutdown(&self) {
        self.inner.state().closed = true;
        let batches = std::mem::take(&mut *self.batches());
        if !batches.is_empty() {
            debug!(abandoned = batches.len(), "recipient name batches cancelled");
        }
        for batch in batches {
            batch.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state().closed
    }

    fn batches(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RecipientNameResolver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ResolverInner {
    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn lookup(&self, uid: &str) -> RecipientName {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let path = self.config.user_path(uid);
        let result = self
            .store
            .get_document(&path)
            .await
            .map(|snapshot| UserDirectoryEntry::from_snapshot(&snapshot));
        match &result {
            Err(error) => warn!(uid, %error, "recipient lookup failed"),
            Ok(None) => debug!(uid, "recipient not in directory"),
            Ok(Some(_)) => {}
        }
        RecipientName::from_lookup(result)
    }

    /// Lands one batch. Publishing happens under the state lock so snapshots
    /// go out in merge order.
    fn merge(&self, results: Vec<(String, RecipientName)>) {
        let mut state = self.state();
        if state.closed {
            debug!(discarded = results.len(), "resolver closed, dropping names");
            return;
        }
        for (uid, name) in results {
            state.pending.remove(&uid);
            state.names.entry(uid).or_insert(name);
        }
        self.names_tx.send_replace(Arc::new(state.names.clone()));
    }
}

async fn run_batch(inner: Arc<ResolverInner>, uids: Vec<String>) {
    let limit = inner.config.lookup_concurrency.max(1);
    let results: Vec<(String, RecipientName)> = stream::iter(uids)
        .map(|uid| {
            let inner = Arc::clone(&inner);
            async move {
                let name = inner.lookup(&uid).await;
                (uid, name)
            }
        })
        .buffer_unordered(limit)
        .collect()
        .await;
    inner.merge(results);
}
