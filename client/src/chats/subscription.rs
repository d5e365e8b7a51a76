use crate::config::ClientConfig;
use crate::store::{DocumentStore, ListenerRegistration, SnapshotEvent, StoreResult};
use chatlist_model::{decode_chat_list, ChatSummary, DocumentPath, DocumentSnapshot, UserId};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The chat list as of one snapshot. `revision` counts applied snapshots.
#[derive(Debug, Clone, Default)]
pub struct ChatListRevision {
    pub revision: u64,
    pub chats: Arc<Vec<ChatSummary>>,
}

type SharedRegistration = Arc<Mutex<Option<ListenerRegistration>>>;

/// One live listener on a user's aggregate chat document.
///
/// Every snapshot replaces the published list wholesale. The listener is
/// released on [`close`](Self::close), on drop, and when the store reports a
/// terminal error.
pub struct ChatSummarySubscription {
    user: UserId,
    path: DocumentPath,
    chats_rx: watch::Receiver<ChatListRevision>,
    registration: SharedRegistration,
    task: JoinHandle<()>,
}

impl ChatSummarySubscription {
    pub fn open(
        store: Arc<dyn DocumentStore>,
        config: &ClientConfig,
        user: &UserId,
    ) -> StoreResult<Self> {
        let path = config.chats_path(user);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let registration = store.subscribe(&path, event_tx)?;
        info!(%path, listener = %registration.id(), "chat list subscription opened");

        let registration: SharedRegistration = Arc::new(Mutex::new(Some(registration)));
        let (chats_tx, chats_rx) = watch::channel(ChatListRevision::default());
        let task = tokio::spawn(apply_events(
            path.clone(),
            event_rx,
            chats_tx,
            Arc::clone(&registration),
        ));

        Ok(Self {
            user: user.clone(),
            path,
            chats_rx,
            registration,
            task,
        })
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn chats(&self) -> Arc<Vec<ChatSummary>> {
        Arc::clone(&self.chats_rx.borrow().chats)
    }

    pub fn revision(&self) -> u64 {
        self.chats_rx.borrow().revision
    }

    pub fn watch(&self) -> watch::Receiver<ChatListRevision> {
        self.chats_rx.clone()
    }

    /// Still attached to the store and applying snapshots.
    pub fn is_listening(&self) -> bool {
        !self.task.is_finished()
            && self
                .registration
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
    }

    /// Waits until at least `revision` snapshots have been applied. Returns
    /// `false` if the listener ended first.
    pub async fn wait_for_revision(&self, revision: u64) -> bool {
        let mut rx = self.chats_rx.clone();
        let reached = rx
            .wait_for(|current| current.revision >= revision)
            .await
            .is_ok();
        reached
    }

    pub fn close(self) {}

    fn teardown(&mut self) {
        self.task.abort();
        if release(&self.registration) {
            info!(path = %self.path, "chat list subscription closed");
        }
    }
}

impl Drop for ChatSummarySubscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn apply_events(
    path: DocumentPath,
    mut events: mpsc::UnboundedReceiver<SnapshotEvent>,
    chats_tx: watch::Sender<ChatListRevision>,
    registration: SharedRegistration,
) {
    while let Some(event) = events.recv().await {
        match event {
            Ok(snapshot) => apply_snapshot(&chats_tx, &snapshot),
            Err(error) => {
                warn!(%path, %error, "chat list listener failed");
                break;
            }
        }
    }
    release(&registration);
}

fn apply_snapshot(chats_tx: &watch::Sender<ChatListRevision>, snapshot: &DocumentSnapshot) {
    let (chats, report) = decode_chat_list(snapshot);
    if !report.is_clean() {
        warn!(
            path = %snapshot.path,
            skipped = report.skipped,
            errors = ?report.errors,
            "skipped malformed chat entries"
        );
    }
    let count = chats.len();
    let chats = Arc::new(chats);
    chats_tx.send_modify(|current| {
        current.revision += 1;
        current.chats = chats;
    });
    debug!(path = %snapshot.path, count, revision = chats_tx.borrow().revision, "chat list replaced");
}

/// Returns `true` if this call released the listener.
fn release(registration: &SharedRegistration) -> bool {
    let taken = registration
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match taken {
        Some(registration) => {
            registration.remove();
            true
        }
        None => false,
    }
}
