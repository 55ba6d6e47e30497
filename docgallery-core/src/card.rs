//! Per-document card state: thumbnail loading and the full-size overlay.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::keyboard::{Key, KeyListenerGuard, KeyboardHub};
use crate::model::Document;
use crate::thumbnail::thumbnail_for;

/// Where a click on a card landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTarget {
    Body,
    DragHandle,
    OverlayBackground,
    OverlayContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    pub image: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: i64,
    pub drag_id: String,
    pub title: String,
    pub thumbnail: String,
    pub alt: String,
    pub show_spinner: bool,
    pub overlay: Option<OverlayView>,
}

type OverlaySlot = Arc<Mutex<Option<KeyListenerGuard>>>;

pub struct DocumentCard {
    document: Document,
    image_loaded: bool,
    // Some while the overlay is open; the guard keeps the Escape listener.
    overlay: OverlaySlot,
    keys: KeyboardHub,
}

impl DocumentCard {
    pub fn new(document: Document, keys: KeyboardHub) -> Self {
        Self {
            document,
            image_loaded: false,
            overlay: Arc::new(Mutex::new(None)),
            keys,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn thumbnail(&self) -> &'static str {
        thumbnail_for(&self.document.kind)
    }

    /// Takes the latest record for the same id. Loading and overlay state
    /// carry over.
    pub fn update(&mut self, document: Document) {
        if document.kind != self.document.kind {
            self.image_loaded = false;
        }
        self.document = document;
    }

    pub fn click(&mut self, target: CardTarget) {
        match target {
            CardTarget::Body => self.open_overlay(),
            CardTarget::OverlayBackground => self.close_overlay(),
            CardTarget::DragHandle | CardTarget::OverlayContent => {}
        }
    }

    /// Key pressed while the overlay itself has focus.
    pub fn overlay_key_down(&mut self, key: Key) {
        if key == Key::Escape {
            self.close_overlay();
        }
    }

    pub fn image_loaded(&mut self) {
        self.image_loaded = true;
    }

    pub fn is_overlay_open(&self) -> bool {
        self.overlay.lock().is_some()
    }

    fn open_overlay(&self) {
        let mut slot = self.overlay.lock();
        if slot.is_some() {
            return;
        }
        let weak = Arc::downgrade(&self.overlay);
        *slot = Some(self.keys.listen(move |key| {
            if key != Key::Escape {
                return;
            }
            if let Some(overlay) = weak.upgrade() {
                overlay.lock().take();
            }
        }));
    }

    pub fn close_overlay(&self) {
        self.overlay.lock().take();
    }

    pub fn view(&self) -> CardView {
        let thumbnail = self.thumbnail().to_string();
        let overlay = self.is_overlay_open().then(|| OverlayView {
            image: thumbnail.clone(),
            alt: self.document.title.clone(),
        });
        CardView {
            id: self.document.id,
            drag_id: self.document.drag_id(),
            title: self.document.title.clone(),
            thumbnail,
            alt: self.document.title.clone(),
            show_spinner: !self.image_loaded,
            overlay,
        }
    }
}

/// Cards keyed by document id, so their state follows a document across
/// reorders.
pub struct CardDeck {
    keys: KeyboardHub,
    cards: HashMap<i64, DocumentCard>,
}

impl CardDeck {
    pub fn new(keys: KeyboardHub) -> Self {
        Self {
            keys,
            cards: HashMap::new(),
        }
    }

    /// Mounts cards for new documents and unmounts cards whose document is
    /// gone. Returns the views in `documents` order.
    pub fn sync(&mut self, documents: &[Document]) -> Vec<CardView> {
        self.cards
            .retain(|id, _| documents.iter().any(|doc| doc.id == *id));
        documents
            .iter()
            .map(|doc| {
                let card = self
                    .cards
                    .entry(doc.id)
                    .and_modify(|card| card.update(doc.clone()))
                    .or_insert_with(|| DocumentCard::new(doc.clone(), self.keys.clone()));
                card.view()
            })
            .collect()
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut DocumentCard> {
        self.cards.get_mut(&id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.cards.len()
    }
}
