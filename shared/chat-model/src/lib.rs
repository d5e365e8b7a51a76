//! Chat-list models shared across ChatList crates.
//!
//! The aggregate chat document and the user directory are owned by the remote
//! document service; everything here is a read-only local mirror of them.

pub mod directory;
pub mod snapshot;

pub use directory::{RecipientName, UserDirectoryEntry};
pub use snapshot::{decode_chat_list, distinct_recipients, DecodeReport, DocumentPath, DocumentSnapshot};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a signed-in user, as handed out by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Accepts any non-blank identifier. Blank values mean "not signed in yet".
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counterpart of a chat as stored in the aggregate chat document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: String,
}

/// One entry of the aggregate chat document's `chats` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub chat_id: String,
    pub user_info: UserInfo,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_message: String,
    /// Milliseconds since the Unix epoch. Fractional values are truncated.
    #[serde(default, deserialize_with = "epoch_millis")]
    pub timestamp: i64,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any JSON number; null reads as 0.
fn epoch_millis<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    let Some(number) = number else {
        return Ok(0);
    };
    if let Some(ms) = number.as_i64() {
        return Ok(ms);
    }
    if let Some(ms) = number.as_u64() {
        return Ok(i64::try_from(ms).unwrap_or(i64::MAX));
    }
    match number.as_f64() {
        Some(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
        _ => Err(serde::de::Error::custom(format!("timestamp out of range: {number}"))),
    }
}

impl ChatSummary {
    pub fn new(
        chat_id: impl Into<String>,
        recipient_uid: impl Into<String>,
        last_message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_info: UserInfo {
                uid: recipient_uid.into(),
            },
            last_message: last_message.into(),
            timestamp,
        }
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| ModelError::Decode(e.to_string()))
    }

    pub fn recipient_uid(&self) -> &str {
        &self.user_info.uid
    }
}

/// Model-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("malformed document: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
