pub mod cache;
pub mod card;
pub mod drag;
pub mod error;
pub mod grid;
pub mod keyboard;
pub mod model;
pub mod reorder;
pub mod repository;
pub mod status;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use docgallery_common::{GalleryConfig, build_http_client};
use log::info;
use std::sync::Arc;

pub use cache::DocumentCache;
pub use error::StoreError;
pub use grid::DocumentGrid;
pub use model::Document;
pub use repository::{DocumentRepository, DocumentStore};

/// Wires the HTTP repository, cache and grid controller for `config`.
pub fn initialize_grid(config: &GalleryConfig) -> Result<Arc<DocumentGrid>> {
    info!("Using document store at {}", config.api_url);
    let client = build_http_client(config)?;
    let repository = DocumentRepository::new(client, config);
    let cache = Arc::new(DocumentCache::new(Arc::new(repository), config.stale_time));
    Ok(Arc::new(DocumentGrid::new(cache, config)))
}
