//! Client-side cache for the document sequence.
//!
//! The cache is the only holder of the sequence the grid renders. Reads go
//! through [`DocumentCache::ensure_fresh`]; writes go through
//! [`DocumentCache::update_positions`], which applies the new order
//! optimistically and then either commits it (followed by a refetch) or
//! rolls back to the snapshot taken when the write started.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;

use crate::error::StoreError;
use crate::model::Document;
use crate::repository::DocumentStore;

pub const DOCUMENTS_KEY: &str = "documents";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Pending,
    Error,
    Success,
}

#[derive(Debug, Clone)]
pub struct QueryState {
    pub data: Option<Vec<Document>>,
    pub status: QueryStatus,
    pub error: Option<String>,
    pub is_fetching: bool,
    pub is_mutating: bool,
    pub updated_at: Option<Instant>,
    pub invalidated: bool,
    /// When the last write was accepted by the store.
    pub saved_at: Option<Instant>,
    generation: u64,
}

impl QueryState {
    fn new() -> Self {
        Self {
            data: None,
            status: QueryStatus::Pending,
            error: None,
            is_fetching: false,
            is_mutating: false,
            updated_at: None,
            invalidated: false,
            saved_at: None,
            generation: 0,
        }
    }

    pub fn documents(&self) -> &[Document] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// Where an optimistic write stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimisticState {
    Pending { snapshot: Option<Vec<Document>> },
    Committed,
    RolledBack,
}

/// An optimistic write in progress. Resolve it with [`commit`] or
/// [`rollback`]; dropping it unresolved rolls back.
///
/// [`commit`]: OptimisticUpdate::commit
/// [`rollback`]: OptimisticUpdate::rollback
pub struct OptimisticUpdate<'a> {
    cache: &'a DocumentCache,
    state: OptimisticState,
}

impl OptimisticUpdate<'_> {
    #[cfg(test)]
    pub(crate) fn state(&self) -> &OptimisticState {
        &self.state
    }

    pub fn commit(mut self) {
        self.settle(false);
    }

    pub fn rollback(mut self) {
        self.settle(true);
    }

    fn settle(&mut self, restore: bool) {
        let next = if restore {
            OptimisticState::RolledBack
        } else {
            OptimisticState::Committed
        };
        let OptimisticState::Pending { snapshot } = std::mem::replace(&mut self.state, next) else {
            return;
        };
        self.cache.state.send_modify(|s| {
            s.is_mutating = false;
            if !restore {
                s.saved_at = Some(Instant::now());
            } else if let Some(previous) = snapshot {
                s.data = Some(previous);
            }
        });
    }
}

impl Drop for OptimisticUpdate<'_> {
    fn drop(&mut self) {
        if matches!(self.state, OptimisticState::Pending { .. }) {
            debug!("Optimistic update of '{DOCUMENTS_KEY}' dropped unresolved, rolling back");
            self.settle(true);
        }
    }
}

pub struct DocumentCache {
    store: Arc<dyn DocumentStore>,
    state: watch::Sender<QueryState>,
    write_slot: Mutex<()>,
    stale_time: Duration,
}

impl DocumentCache {
    pub fn new(store: Arc<dyn DocumentStore>, stale_time: Duration) -> Self {
        let (state, _) = watch::channel(QueryState::new());
        Self {
            store,
            state,
            write_slot: Mutex::new(()),
            stale_time,
        }
    }

    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.borrow().documents().to_vec()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    /// Returns the cached sequence if it is still fresh, fetching otherwise.
    pub async fn ensure_fresh(&self) -> Result<Vec<Document>, StoreError> {
        if let Some(documents) = self.fresh_documents() {
            return Ok(documents);
        }
        self.fetch().await
    }

    fn fresh_documents(&self) -> Option<Vec<Document>> {
        let state = self.state.borrow();
        let updated_at = state.updated_at?;
        if state.invalidated || updated_at.elapsed() >= self.stale_time {
            return None;
        }
        state.data.clone()
    }

    pub async fn fetch(&self) -> Result<Vec<Document>, StoreError> {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.is_fetching = true;
            generation = s.generation;
        });

        let result = self.store.fetch_documents().await;

        self.state.send_modify(|s| {
            if s.generation != generation {
                debug!("Discarding cancelled fetch of '{DOCUMENTS_KEY}'");
                return;
            }
            s.is_fetching = false;
            match &result {
                Ok(documents) => {
                    s.data = Some(documents.clone());
                    s.status = QueryStatus::Success;
                    s.error = None;
                    s.updated_at = Some(Instant::now());
                    s.invalidated = false;
                }
                Err(e) => {
                    s.error = Some(e.to_string());
                    // A failed background refetch keeps the data it had.
                    if s.data.is_none() {
                        s.status = QueryStatus::Error;
                    }
                }
            }
        });

        result
    }

    /// Marks the cached value stale and refetches it.
    pub async fn invalidate(&self) -> Result<Vec<Document>, StoreError> {
        self.state.send_modify(|s| s.invalidated = true);
        self.fetch().await
    }

    /// Makes any fetch currently in flight discard its result.
    pub fn cancel_queries(&self) {
        self.state.send_modify(Self::cancel_in_place);
    }

    fn cancel_in_place(state: &mut QueryState) {
        state.generation += 1;
        if state.is_fetching {
            debug!("Cancelled in-flight fetch of '{DOCUMENTS_KEY}'");
        }
        state.is_fetching = false;
    }

    /// Cancels in-flight reads, snapshots the current value and overwrites
    /// it with `documents`. Nothing is written when no value is cached yet.
    pub fn begin_optimistic(&self, documents: Vec<Document>) -> OptimisticUpdate<'_> {
        let mut snapshot = None;
        self.state.send_modify(|s| {
            Self::cancel_in_place(s);
            snapshot = s.data.clone();
            s.is_mutating = true;
            if s.data.is_some() {
                s.data = Some(documents);
            }
        });
        OptimisticUpdate {
            cache: self,
            state: OptimisticState::Pending { snapshot },
        }
    }

    /// Submits `documents` as the new order. Waits for any write already
    /// in flight to settle first.
    pub async fn update_positions(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>, StoreError> {
        let _slot = self.write_slot.lock().await;
        self.run_mutation(documents).await
    }

    /// Like [`update_positions`](Self::update_positions) but returns `None`
    /// without submitting when a write is already in flight.
    pub async fn try_update_positions(
        &self,
        documents: Vec<Document>,
    ) -> Option<Result<Vec<Document>, StoreError>> {
        let Ok(_slot) = self.write_slot.try_lock() else {
            debug!("Write to '{DOCUMENTS_KEY}' already in flight, skipping");
            return None;
        };
        Some(self.run_mutation(documents).await)
    }

    async fn run_mutation(&self, documents: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let update = self.begin_optimistic(documents.clone());

        match self.store.update_positions(&documents).await {
            Ok(saved) => {
                update.commit();
                info!("Saved positions of {} documents", saved.len());
                if let Err(e) = self.invalidate().await {
                    warn!("Refetch of '{DOCUMENTS_KEY}' after save failed: {e}");
                }
                Ok(saved)
            }
            Err(e) => {
                warn!("Rolling back '{DOCUMENTS_KEY}' after failed save: {e}");
                update.rollback();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, seed_documents};

    fn cache_over(store: &Arc<MemoryStore>) -> Arc<DocumentCache> {
        Arc::new(DocumentCache::new(store.clone(), Duration::ZERO))
    }

    #[tokio::test]
    async fn first_read_fetches_from_store() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        assert_eq!(cache.state().status, QueryStatus::Pending);

        let documents = cache.ensure_fresh().await.unwrap();
        assert_eq!(documents, seed_documents());
        assert_eq!(cache.state().status, QueryStatus::Success);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn fresh_value_is_served_from_cache() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = Arc::new(DocumentCache::new(store.clone(), Duration::from_secs(60)));
        cache.ensure_fresh().await.unwrap();
        cache.ensure_fresh().await.unwrap();
        assert_eq!(store.fetch_count(), 1);

        cache.invalidate().await.unwrap();
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_first_read_sets_error() {
        let store = Arc::new(MemoryStore::seeded());
        store.fail_fetches_with(Some(503));
        let cache = cache_over(&store);

        let err = cache.ensure_fresh().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        let state = cache.state();
        assert_eq!(state.status, QueryStatus::Error);
        assert!(state.data.is_none());
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn new_order_is_visible_before_the_store_answers() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        cache.ensure_fresh().await.unwrap();

        let reordered = crate::reorder::move_document(cache.documents(), 0, 2);
        store.hold_updates(true);
        let task = {
            let cache = cache.clone();
            let reordered = reordered.clone();
            tokio::spawn(async move { cache.update_positions(reordered).await })
        };
        store.update_started().await;

        assert_eq!(cache.documents(), reordered);
        assert!(cache.state().is_mutating);

        store.release_update();
        task.await.unwrap().unwrap();
        assert!(!cache.state().is_mutating);
        assert_eq!(cache.documents(), store.documents());
    }

    #[tokio::test]
    async fn failed_write_restores_the_snapshot() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        cache.ensure_fresh().await.unwrap();
        let before = cache.documents();

        store.fail_updates_with(Some(500));
        let reordered = crate::reorder::move_document(before.clone(), 4, 0);
        let err = cache.update_positions(reordered).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(cache.documents(), before);
        assert!(!cache.state().is_mutating);
        // ロールバックでは再取得しない
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn successful_write_converges_to_store_state() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        cache.ensure_fresh().await.unwrap();

        let mut guess = crate::reorder::move_document(cache.documents(), 1, 0);
        guess.push(Document {
            id: 99,
            kind: "unknown".into(),
            title: "Ghost".into(),
            position: 5,
        });
        cache.update_positions(guess).await.unwrap();

        let documents = cache.documents();
        assert_eq!(documents, store.documents());
        assert!(documents.iter().all(|d| d.id != 99));
        assert_eq!(documents[0].kind, "bill-of-lading");
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn write_cancels_in_flight_read() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        cache.ensure_fresh().await.unwrap();
        let before = cache.documents();

        store.hold_next_fetch();
        let read = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.fetch().await })
        };
        store.fetch_started().await;
        assert!(cache.state().is_fetching);

        store.fail_updates_with(Some(500));
        let _ = cache
            .update_positions(crate::reorder::move_document(before.clone(), 0, 1))
            .await;
        assert!(!cache.state().is_fetching);

        store.replace_documents(Vec::new());
        store.release_fetch();
        read.await.unwrap().unwrap();

        assert_eq!(cache.documents(), before);
    }

    #[test]
    fn dropping_an_unresolved_update_rolls_back() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = DocumentCache::new(store, Duration::ZERO);
        cache.state.send_modify(|s| s.data = Some(seed_documents()));

        let reordered = crate::reorder::move_document(seed_documents(), 0, 3);
        let update = cache.begin_optimistic(reordered.clone());
        assert_eq!(
            update.state(),
            &OptimisticState::Pending {
                snapshot: Some(seed_documents())
            }
        );
        assert_eq!(cache.documents(), reordered);

        drop(update);
        assert_eq!(cache.documents(), seed_documents());
        assert!(!cache.state().is_mutating);
    }

    #[test]
    fn committed_update_keeps_new_order() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = DocumentCache::new(store, Duration::ZERO);
        cache.state.send_modify(|s| s.data = Some(seed_documents()));

        let reordered = crate::reorder::move_document(seed_documents(), 2, 0);
        cache.begin_optimistic(reordered.clone()).commit();
        assert_eq!(cache.documents(), reordered);
    }

    #[tokio::test]
    async fn nothing_is_written_optimistically_before_first_load() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);

        store.hold_updates(true);
        let task = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.update_positions(seed_documents()).await })
        };
        store.update_started().await;
        assert!(cache.state().data.is_none());

        store.release_update();
        task.await.unwrap().unwrap();
        assert_eq!(cache.documents(), store.documents());
    }

    #[tokio::test]
    async fn overlapping_try_write_is_skipped() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        cache.ensure_fresh().await.unwrap();

        store.hold_updates(true);
        let task = {
            let cache = cache.clone();
            let documents = cache.documents();
            tokio::spawn(async move { cache.update_positions(documents).await })
        };
        store.update_started().await;

        assert!(cache.try_update_positions(cache.documents()).await.is_none());

        store.release_update();
        task.await.unwrap().unwrap();
        assert_eq!(store.submissions().len(), 1);
    }

    #[tokio::test]
    async fn queued_write_runs_after_failed_write() {
        let store = Arc::new(MemoryStore::seeded());
        let cache = cache_over(&store);
        cache.ensure_fresh().await.unwrap();
        let before = cache.documents();

        store.hold_updates(true);
        store.fail_updates_with(Some(500));
        let first = {
            let cache = cache.clone();
            let reordered = crate::reorder::move_document(before.clone(), 0, 1);
            tokio::spawn(async move { cache.update_positions(reordered).await })
        };
        store.update_started().await;

        let queued_order = crate::reorder::move_document(before.clone(), 4, 0);
        let second = {
            let cache = cache.clone();
            let reordered = queued_order.clone();
            tokio::spawn(async move { cache.update_positions(reordered).await })
        };
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.submissions().len(), 1);

        store.release_update();
        let err = first.await.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(500));

        // 2件目は1件目のロールバック後に始まる
        store.update_started().await;
        assert_eq!(store.submissions().len(), 2);
        assert_eq!(cache.documents(), queued_order);

        store.fail_updates_with(None);
        store.hold_updates(false);
        store.release_update();
        second.await.unwrap().unwrap();

        let ids: Vec<i64> = cache.documents().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![5, 1, 2, 3, 4]);
        assert_eq!(cache.documents(), store.documents());
        assert!(cache.state().saved_at.is_some());
    }
}
