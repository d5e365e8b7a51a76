//! Live chat list for the signed-in user and the names shown next to it.

mod resolver;
mod rows;
mod screen;
mod subscription;

pub use resolver::{NameMap, RecipientNameResolver};
pub use rows::{format_timestamp, project_rows, ChatListView, ChatRow, ChatSelection, EMPTY_CHATS_TEXT};
pub use screen::ChatListScreen;
pub use subscription::{ChatListRevision, ChatSummarySubscription};
