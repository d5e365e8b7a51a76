use super::resolver::{NameMap, RecipientNameResolver};
use super::rows::{ChatListView, ChatRow, ChatSelection};
use super::subscription::{ChatListRevision, ChatSummarySubscription};
use crate::config::ClientConfig;
use crate::store::{DocumentStore, StoreResult};
use chatlist_model::{ChatSummary, RecipientName, UserId};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Subscription for one user plus the task feeding its revisions to the
/// resolver.
struct ActiveChatList {
    subscription: ChatSummarySubscription,
    driver: JoinHandle<()>,
    handled_rx: watch::Receiver<u64>,
}

impl Drop for ActiveChatList {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// The chat-list screen: follows the signed-in user, keeps the list live and
/// the names resolved.
pub struct ChatListScreen {
    store: Arc<dyn DocumentStore>,
    config: ClientConfig,
    resolver: Arc<RecipientNameResolver>,
    active: Option<ActiveChatList>,
    selection: Option<ChatSelection>,
}

impl ChatListScreen {
    /// Without a user nothing is opened; the screen stays empty until
    /// [`set_user`](Self::set_user) supplies one.
    pub fn mount(
        store: Arc<dyn DocumentStore>,
        config: ClientConfig,
        user: Option<UserId>,
    ) -> StoreResult<Self> {
        let resolver = Arc::new(RecipientNameResolver::new(
            Arc::clone(&store),
            config.clone(),
        ));
        let mut screen = Self {
            store,
            config,
            resolver,
            active: None,
            selection: None,
        };
        screen.set_user(user)?;
        Ok(screen)
    }

    /// Re-targets the screen. The old listener is released before the new one
    /// opens; resolved names are kept. Setting the same user again only
    /// reopens a listener that has ended.
    pub fn set_user(&mut self, user: Option<UserId>) -> StoreResult<()> {
        if self.current_user() == user.as_ref() && (user.is_none() || self.is_subscribed()) {
            return Ok(());
        }

        if let Some(previous) = self.active.take() {
            info!(user = %previous.subscription.user(), "leaving chat list");
        }
        self.selection = None;

        let Some(user) = user else {
            debug!(session = %self.config.session_id, "no signed-in user, chat list not subscribed");
            return Ok(());
        };

        if self.resolver.is_closed() {
            debug!(%user, "remounting after dismiss, starting a fresh resolver");
            self.resolver = Arc::new(RecipientNameResolver::new(
                Arc::clone(&self.store),
                self.config.clone(),
            ));
        }

        let subscription =
            ChatSummarySubscription::open(Arc::clone(&self.store), &self.config, &user)?;
        let (handled_tx, handled_rx) = watch::channel(0);
        let driver = tokio::spawn(drive_resolver(
            subscription.watch(),
            Arc::clone(&self.resolver),
            handled_tx,
        ));
        info!(%user, session = %self.config.session_id, "chat list mounted");
        self.active = Some(ActiveChatList {
            subscription,
            driver,
            handled_rx,
        });
        Ok(())
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.active
            .as_ref()
            .map(|active| active.subscription.user())
    }

    pub fn is_subscribed(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.subscription.is_listening())
    }

    pub fn chats(&self) -> Arc<Vec<ChatSummary>> {
        self.active
            .as_ref()
            .map(|active| active.subscription.chats())
            .unwrap_or_default()
    }

    pub fn revision(&self) -> u64 {
        self.active
            .as_ref()
            .map_or(0, |active| active.subscription.revision())
    }

    pub fn names(&self) -> NameMap {
        self.resolver.names()
    }

    pub fn name_for(&self, uid: &str) -> RecipientName {
        self.resolver.name_for(uid)
    }

    pub fn resolver(&self) -> &RecipientNameResolver {
        &self.resolver
    }

    pub fn view(&self) -> ChatListView {
        ChatListView::build(&self.chats(), &self.names())
    }

    pub fn rows(&self) -> Vec<ChatRow> {
        match self.view() {
            ChatListView::Empty => Vec::new(),
            ChatListView::Rows(rows) => rows,
        }
    }

    /// Picks a chat from the current list for the conversation screen.
    pub fn select_chat(&mut self, chat_id: &str) -> Option<ChatSelection> {
        let chats = self.chats();
        let chat = chats.iter().find(|chat| chat.chat_id == chat_id)?;
        let selection = ChatSelection::from_chat(chat);
        info!(chat_id, recipient = %selection.recipient.uid, "chat selected");
        self.selection = Some(selection.clone());
        Some(selection)
    }

    pub fn selection(&self) -> Option<&ChatSelection> {
        self.selection.as_ref()
    }

    /// Waits until `revision` snapshots have been applied. `false` when the
    /// screen has no live listener or it ended first.
    pub async fn wait_for_revision(&self, revision: u64) -> bool {
        match &self.active {
            Some(active) => active.subscription.wait_for_revision(revision).await,
            None => false,
        }
    }

    /// Waits for the first snapshot, for the resolver to have seen the latest
    /// applied revision, and for all lookups to finish.
    pub async fn settle(&self) {
        if let Some(active) = &self.active {
            let target = active.subscription.revision().max(1);
            if active.subscription.wait_for_revision(target).await {
                let mut handled = active.handled_rx.clone();
                let _ = handled.wait_for(|handled| *handled >= target).await;
            }
        }
        self.resolver.wait_idle().await;
    }

    /// Tears everything down. In-flight lookups are abandoned and their
    /// results dropped; a later [`set_user`](Self::set_user) starts over with
    /// an empty name cache.
    pub fn dismiss(&mut self) {
        if let Some(active) = self.active.take() {
            info!(user = %active.subscription.user(), "chat list dismissed");
        }
        self.selection = None;
        self.resolver.shutdown();
    }
}

impl Drop for ChatListScreen {
    fn drop(&mut self) {
        self.dismiss();
    }
}

/// Feeds list revisions to the resolver. The `watch` coalesces bursts, so
/// only the newest list is resolved; every revision is still applied to the
/// visible list by the subscription task.
async fn drive_resolver(
    mut chats_rx: watch::Receiver<ChatListRevision>,
    resolver: Arc<RecipientNameResolver>,
    handled_tx: watch::Sender<u64>,
) {
    loop {
        let current = chats_rx.borrow_and_update().clone();
        resolver.resolve(&current.chats);
        handled_tx.send_replace(current.revision);
        if chats_rx.changed().await.is_err() {
            break;
        }
    }
}
