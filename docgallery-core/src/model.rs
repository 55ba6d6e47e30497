use serde::{Deserialize, Serialize};

/// A document record as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub position: i64,
}

/// The write shape of a document. The store does not accept `id` on
/// batch writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub position: i64,
}

impl Document {
    /// Identifier used by the drag sensors to track this document.
    pub fn drag_id(&self) -> String {
        format!("document-{}", self.id)
    }

    pub fn to_payload(&self) -> DocumentPayload {
        DocumentPayload {
            kind: self.kind.clone(),
            title: self.title.clone(),
            position: self.position,
        }
    }
}
