//! In-memory document store for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::error::StoreError;
use crate::model::{Document, DocumentPayload};
use crate::repository::DocumentStore;

pub(crate) fn seed_documents() -> Vec<Document> {
    [
        ("bank-draft", "Bank Draft"),
        ("bill-of-lading", "Bill of Lading"),
        ("invoice", "Invoice"),
        ("bank-draft-2", "Bank Draft 2"),
        ("bill-of-lading-2", "Bill of Lading 2"),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (kind, title))| Document {
        id: i as i64 + 1,
        kind: kind.to_string(),
        title: title.to_string(),
        position: i as i64,
    })
    .collect()
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    submissions: Mutex<Vec<Vec<DocumentPayload>>>,
    fetches: AtomicUsize,
    fetch_failure: Mutex<Option<u16>>,
    update_failure: Mutex<Option<u16>>,
    hold_next_fetch: AtomicBool,
    fetch_gate: Notify,
    fetch_started: Notify,
    hold_updates: AtomicBool,
    update_gate: Notify,
    update_started: Notify,
}

impl MemoryStore {
    pub(crate) fn seeded() -> Self {
        let store = Self::default();
        *store.documents.lock() = seed_documents();
        store
    }

    pub(crate) fn documents(&self) -> Vec<Document> {
        self.documents.lock().clone()
    }

    pub(crate) fn replace_documents(&self, documents: Vec<Document>) {
        *self.documents.lock() = documents;
    }

    pub(crate) fn submissions(&self) -> Vec<Vec<DocumentPayload>> {
        self.submissions.lock().clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_fetches_with(&self, status: Option<u16>) {
        *self.fetch_failure.lock() = status;
    }

    pub(crate) fn fail_updates_with(&self, status: Option<u16>) {
        *self.update_failure.lock() = status;
    }

    pub(crate) fn hold_next_fetch(&self) {
        self.hold_next_fetch.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn fetch_started(&self) {
        self.fetch_started.notified().await;
    }

    pub(crate) fn release_fetch(&self) {
        self.fetch_gate.notify_one();
    }

    pub(crate) fn hold_updates(&self, hold: bool) {
        self.hold_updates.store(hold, Ordering::SeqCst);
    }

    pub(crate) async fn update_started(&self) {
        self.update_started.notified().await;
    }

    pub(crate) fn release_update(&self) {
        self.update_gate.notify_one();
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_documents(&self) -> Result<Vec<Document>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.hold_next_fetch.swap(false, Ordering::SeqCst) {
            self.fetch_started.notify_one();
            self.fetch_gate.notified().await;
        }
        if let Some(status) = *self.fetch_failure.lock() {
            return Err(StoreError::Status { status });
        }
        Ok(self.documents())
    }

    async fn update_positions(&self, documents: &[Document]) -> Result<Vec<Document>, StoreError> {
        let payload: Vec<DocumentPayload> = documents.iter().map(Document::to_payload).collect();
        self.submissions.lock().push(payload.clone());
        if self.hold_updates.load(Ordering::SeqCst) {
            self.update_started.notify_one();
            self.update_gate.notified().await;
        }
        if let Some(status) = *self.update_failure.lock() {
            return Err(StoreError::Status { status });
        }

        // Same matching as the real store: by type, unknown types ignored.
        let mut stored = self.documents.lock();
        for item in &payload {
            if let Some(doc) = stored.iter_mut().find(|d| d.kind == item.kind) {
                doc.title = item.title.clone();
                doc.position = item.position;
            }
        }
        stored.sort_by_key(|d| d.position);
        Ok(stored.clone())
    }
}
