//! Seam to the hosted document service: live listeners and one-shot reads.

mod memory;

pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use chatlist_model::{DocumentPath, DocumentSnapshot};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// One delivery from a live listener. An `Err` is terminal for that listener.
pub type SnapshotEvent = StoreResult<DocumentSnapshot>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document service unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("listener closed")]
    Closed,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Starts a live listener on `path`. The current state is delivered first,
    /// then every change, in order, until the registration is released.
    fn subscribe(
        &self,
        path: &DocumentPath,
        sink: mpsc::UnboundedSender<SnapshotEvent>,
    ) -> StoreResult<ListenerRegistration>;

    /// One-shot read. A missing document is a snapshot without data.
    async fn get_document(&self, path: &DocumentPath) -> StoreResult<DocumentSnapshot>;
}

/// Handle to a live listener. Releasing happens exactly once, either through
/// [`ListenerRegistration::remove`] or on drop.
pub struct ListenerRegistration {
    id: Uuid,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerRegistration {
    pub fn new(id: Uuid, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn remove(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}
