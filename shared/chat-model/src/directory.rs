//! User directory records and the display names derived from them.

use crate::snapshot::DocumentSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN_USER: &str = "Unknown User";
pub const LOOKUP_FAILED: &str = "Error";
pub const LOADING: &str = "Loading...";

/// A per-user record from the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDirectoryEntry {
    pub uid: String,
    /// `None` when the record has no usable `displayName`.
    pub display_name: Option<String>,
}

impl UserDirectoryEntry {
    /// Builds an entry from a one-shot read. Returns `None` for an absent record.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Option<Self> {
        if !snapshot.exists() {
            return None;
        }
        let display_name = snapshot
            .field("displayName")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        Some(Self {
            uid: snapshot.path.document_id.clone(),
            display_name,
        })
    }
}

/// What the chat list shows for a counterpart.
///
/// `UnknownUser` and `LookupFailed` are sentinels: they render like plain
/// strings but never compare equal to a `Resolved` name with the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecipientName {
    Resolved(String),
    UnknownUser,
    LookupFailed,
    Loading,
}

impl RecipientName {
    /// Maps the outcome of a directory read onto a name.
    pub fn from_lookup<E>(result: Result<Option<UserDirectoryEntry>, E>) -> Self {
        match result {
            Ok(Some(UserDirectoryEntry {
                display_name: Some(name),
                ..
            })) => Self::Resolved(name),
            Ok(_) => Self::UnknownUser,
            Err(_) => Self::LookupFailed,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(name) => name,
            Self::UnknownUser => UNKNOWN_USER,
            Self::LookupFailed => LOOKUP_FAILED,
            Self::Loading => LOADING,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for RecipientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
