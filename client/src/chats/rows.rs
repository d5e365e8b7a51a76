//! What the rendering layer reads: one row per chat, or the empty state.

use chatlist_model::{ChatSummary, RecipientName, UserInfo};
use chrono::DateTime;
use std::collections::HashMap;

pub const EMPTY_CHATS_TEXT: &str = "You have no active chats.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRow {
    pub chat_id: String,
    pub recipient_uid: String,
    pub name: RecipientName,
    pub last_message: String,
    pub timestamp_ms: i64,
    pub timestamp_label: String,
}

impl ChatRow {
    pub fn display_name(&self) -> &str {
        self.name.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatListView {
    Empty,
    Rows(Vec<ChatRow>),
}

impl ChatListView {
    pub fn build(chats: &[ChatSummary], names: &HashMap<String, RecipientName>) -> Self {
        if chats.is_empty() {
            Self::Empty
        } else {
            Self::Rows(project_rows(chats, names))
        }
    }

    /// Plain-text rendering, one line per row.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Empty => vec![EMPTY_CHATS_TEXT.to_string()],
            Self::Rows(rows) => rows
                .iter()
                .map(|row| {
                    format!(
                        "{}  {}  [{}]",
                        row.display_name(),
                        row.last_message,
                        row.timestamp_label
                    )
                })
                .collect(),
        }
    }
}

/// Rows in list order. Uids missing from `names` show as `Loading`.
pub fn project_rows(
    chats: &[ChatSummary],
    names: &HashMap<String, RecipientName>,
) -> Vec<ChatRow> {
    chats
        .iter()
        .map(|chat| ChatRow {
            chat_id: chat.chat_id.clone(),
            recipient_uid: chat.user_info.uid.clone(),
            name: names
                .get(chat.recipient_uid())
                .cloned()
                .unwrap_or(RecipientName::Loading),
            last_message: chat.last_message.clone(),
            timestamp_ms: chat.timestamp,
            timestamp_label: format_timestamp(chat.timestamp),
        })
        .collect()
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, or the raw number when out of range.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// Handed to the conversation screen when a row is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSelection {
    pub chat_id: String,
    pub recipient: UserInfo,
}

impl ChatSelection {
    pub fn from_chat(chat: &ChatSummary) -> Self {
        Self {
            chat_id: chat.chat_id.clone(),
            recipient: chat.user_info.clone(),
        }
    }
}
