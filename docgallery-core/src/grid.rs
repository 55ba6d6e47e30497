use docgallery_common::GalleryConfig;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cache::{DocumentCache, QueryStatus};
use crate::card::{CardDeck, CardView, DocumentCard};
use crate::drag::{DragEnd, SortableContext};
use crate::error::StoreError;
use crate::keyboard::KeyboardHub;
use crate::model::Document;
use crate::reorder::move_document;
use crate::status::SaveStatus;

pub const READY_TITLE: &str = "Drag and Drop";
pub const LOADING_TITLE: &str = "Loading documents...";
pub const ERROR_TITLE: &str = "Error loading documents";
pub const ERROR_MESSAGE: &str =
    "There was an error loading the documents. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPhase {
    Loading,
    Error,
    Ready,
}

/// Number of grid columns for a viewport width in pixels.
pub fn grid_columns(viewport_width: u32) -> usize {
    if viewport_width > 768 {
        3
    } else if viewport_width > 480 {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone)]
pub struct GridView {
    pub phase: GridPhase,
    pub title: &'static str,
    pub message: Option<&'static str>,
    pub columns: usize,
    pub cards: Vec<CardView>,
    pub status: SaveStatus,
}

impl GridView {
    pub fn rows(&self) -> impl Iterator<Item = &[CardView]> {
        self.cards.chunks(self.columns.max(1))
    }
}

/// Drives the gallery: loading, reordering, autosave and the save indicator.
pub struct DocumentGrid {
    cache: Arc<DocumentCache>,
    keys: KeyboardHub,
    cards: Mutex<CardDeck>,
    sortable: Mutex<SortableContext>,
    autosave_interval: Duration,
    status_refresh_interval: Duration,
}

impl DocumentGrid {
    pub fn new(cache: Arc<DocumentCache>, config: &GalleryConfig) -> Self {
        let keys = KeyboardHub::new();
        Self {
            cache,
            cards: Mutex::new(CardDeck::new(keys.clone())),
            keys,
            sortable: Mutex::new(SortableContext::new(Vec::new())),
            autosave_interval: config.autosave_interval,
            status_refresh_interval: config.status_refresh_interval,
        }
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    pub fn keys(&self) -> &KeyboardHub {
        &self.keys
    }

    /// Loads the documents unless a fresh copy is cached.
    pub async fn mount(&self) -> GridPhase {
        if let Err(e) = self.cache.ensure_fresh().await {
            warn!("Loading documents failed: {e}");
        }
        self.phase()
    }

    pub fn phase(&self) -> GridPhase {
        let state = self.cache.state();
        if state.data.is_some() {
            GridPhase::Ready
        } else if state.status == QueryStatus::Error {
            GridPhase::Error
        } else {
            GridPhase::Loading
        }
    }

    pub fn documents(&self) -> Vec<Document> {
        self.cache.documents()
    }

    pub fn drag_ids(&self) -> Vec<String> {
        self.cache
            .state()
            .documents()
            .iter()
            .map(Document::drag_id)
            .collect()
    }

    /// Runs `f` against the drag sensors, synced to the current order.
    pub fn with_sortable<R>(&self, f: impl FnOnce(&mut SortableContext) -> R) -> R {
        let mut sortable = self.sortable.lock();
        sortable.set_items(self.drag_ids());
        f(&mut sortable)
    }

    /// Runs `f` against the card for document `id`, if it is displayed.
    pub fn with_card<R>(&self, id: i64, f: impl FnOnce(&mut DocumentCard) -> R) -> Option<R> {
        let documents = self.cache.documents();
        let mut cards = self.cards.lock();
        cards.sync(&documents);
        cards.get_mut(id).map(f)
    }

    /// Reorders after a drop and submits the full sequence. Returns the
    /// store's sequence, or `None` when the drop was not a move.
    pub async fn handle_drag_end(
        &self,
        event: DragEnd,
    ) -> Result<Option<Vec<Document>>, StoreError> {
        if !event.is_move() {
            return Ok(None);
        }
        let documents = self.cache.documents();
        let index_of = |drag_id: &str| documents.iter().position(|d| d.drag_id() == drag_id);
        let from = index_of(&event.active);
        let to = event.over.as_deref().and_then(index_of);
        let (Some(from), Some(to)) = (from, to) else {
            warn!("Ignoring drop of unknown item {event:?}");
            return Ok(None);
        };

        debug!("Moving {} from {from} to {to}", event.active);
        let reordered = move_document(documents, from, to);
        let saved = self.cache.update_positions(reordered).await?;
        Ok(Some(saved))
    }

    /// Submits the current sequence, waiting for any write in flight.
    /// Returns `None` without submitting until documents are loaded.
    pub async fn save_now(&self) -> Option<Result<Vec<Document>, StoreError>> {
        if self.phase() != GridPhase::Ready {
            debug!("Save skipped, documents not loaded");
            return None;
        }
        Some(self.cache.update_positions(self.cache.documents()).await)
    }

    /// One autosave tick. The current sequence is resubmitted whether or
    /// not it changed; the tick is skipped while another write is in flight
    /// or before anything was loaded.
    pub async fn autosave(&self) -> Option<Result<Vec<Document>, StoreError>> {
        if self.phase() != GridPhase::Ready {
            debug!("Autosave skipped, documents not loaded");
            return None;
        }
        self.cache
            .try_update_positions(self.cache.documents())
            .await
    }

    /// Set as soon as the store accepts a write, before the refetch.
    pub fn last_saved(&self) -> Option<Instant> {
        self.cache.state().saved_at
    }

    pub fn save_status(&self) -> SaveStatus {
        if self.cache.state().is_mutating {
            return SaveStatus::Saving;
        }
        match self.last_saved() {
            Some(at) => SaveStatus::SavedAgo(at.elapsed()),
            None => SaveStatus::NotSavedYet,
        }
    }

    pub fn render(&self, viewport_width: u32) -> GridView {
        let phase = self.phase();
        let (title, message) = match phase {
            GridPhase::Loading => (LOADING_TITLE, None),
            GridPhase::Error => (ERROR_TITLE, Some(ERROR_MESSAGE)),
            GridPhase::Ready => (READY_TITLE, None),
        };
        let cards = if phase == GridPhase::Ready {
            self.cards.lock().sync(&self.cache.documents())
        } else {
            Vec::new()
        };
        GridView {
            phase,
            title,
            message,
            columns: grid_columns(viewport_width),
            cards,
            status: self.save_status(),
        }
    }

    /// Starts the autosave and save-indicator timers. Both stop when the
    /// returned handle is dropped.
    pub fn start_timers(self: &Arc<Self>) -> GridTimers {
        let autosave = {
            let grid = self.clone();
            let period = self.autosave_interval;
            tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Some(Err(e)) = grid.autosave().await {
                        warn!("Autosave failed: {e}");
                    }
                }
            })
        };

        let (status_tx, status) = watch::channel(self.save_status());
        let refresh = {
            let grid = self.clone();
            let period = self.status_refresh_interval;
            tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    status_tx.send_replace(grid.save_status());
                }
            })
        };

        info!(
            "Autosave every {:?}, status refresh every {:?}",
            self.autosave_interval, self.status_refresh_interval
        );
        GridTimers {
            autosave,
            refresh,
            status,
        }
    }
}

/// Handle to the running grid timers.
pub struct GridTimers {
    autosave: JoinHandle<()>,
    refresh: JoinHandle<()>,
    status: watch::Receiver<SaveStatus>,
}

impl GridTimers {
    /// Save indicator, refreshed on every display tick.
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }
}

impl Drop for GridTimers {
    fn drop(&mut self) {
        self.autosave.abort();
        self.refresh.abort();
    }
}
