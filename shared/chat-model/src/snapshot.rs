//! Document paths, snapshots, and decoding of the aggregate chat document.

use crate::ChatSummary;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Field of the aggregate chat document holding the chat summaries.
pub const CHATS_FIELD: &str = "chats";

/// `<collection>/<document id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    pub collection: String,
    pub document_id: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document_id: document_id.into(),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document_id)
    }
}

/// Complete point-in-time copy of one document. `data` is `None` when the
/// document does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub path: DocumentPath,
    pub data: Option<Value>,
}

impl DocumentSnapshot {
    pub fn new(path: DocumentPath, data: Option<Value>) -> Self {
        Self { path, data }
    }

    pub fn missing(path: DocumentPath) -> Self {
        Self { path, data: None }
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(name))
    }
}

/// Entries of a `chats` field that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// Reads the `chats` field in backend order. Absent documents, absent fields
/// and non-array fields all decode to an empty list.
pub fn decode_chat_list(snapshot: &DocumentSnapshot) -> (Vec<ChatSummary>, DecodeReport) {
    let mut report = DecodeReport::default();
    let Some(Value::Array(entries)) = snapshot.field(CHATS_FIELD) else {
        return (Vec::new(), report);
    };

    let mut chats = Vec::with_capacity(entries.len());
    for entry in entries {
        match ChatSummary::from_value(entry) {
            Ok(chat) => chats.push(chat),
            Err(e) => {
                report.skipped += 1;
                report.errors.push(e.to_string());
            }
        }
    }
    (chats, report)
}

/// Distinct counterpart uids, in first-seen order.
pub fn distinct_recipients(chats: &[ChatSummary]) -> Vec<String> {
    let mut seen = HashSet::new();
    chats
        .iter()
        .map(ChatSummary::recipient_uid)
        .filter(|uid| seen.insert(*uid))
        .map(str::to_owned)
        .collect()
}
