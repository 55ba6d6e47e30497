use async_trait::async_trait;
use docgallery_common::GalleryConfig;
use log::{debug, error};

use crate::error::StoreError;
use crate::model::{Document, DocumentPayload};

const DOCUMENTS_PATH: &str = "/api/documents/";
const BATCH_PATH: &str = "/api/documents/batch";

/// Remote collaborator holding the authoritative document set.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The full set, ordered by position.
    async fn fetch_documents(&self) -> Result<Vec<Document>, StoreError>;

    /// Replaces every document's position in one batch and returns the
    /// store's resulting set.
    async fn update_positions(&self, documents: &[Document]) -> Result<Vec<Document>, StoreError>;
}

/// HTTP access to the document store.
pub struct DocumentRepository {
    client: reqwest::Client,
    documents_url: String,
    batch_url: String,
}

impl DocumentRepository {
    pub fn new(client: reqwest::Client, config: &GalleryConfig) -> Self {
        Self {
            client,
            documents_url: config.endpoint(DOCUMENTS_PATH),
            batch_url: config.endpoint(BATCH_PATH),
        }
    }

    async fn get_documents(&self) -> Result<Vec<Document>, StoreError> {
        let response = self
            .client
            .get(&self.documents_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn put_batch(&self, payload: &[DocumentPayload]) -> Result<Vec<Document>, StoreError> {
        let response = self
            .client
            .put(&self.batch_url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn fetch_documents(&self) -> Result<Vec<Document>, StoreError> {
        debug!("GET {}", self.documents_url);
        self.get_documents().await.inspect_err(|e| {
            error!("Error fetching documents: {e}");
        })
    }

    async fn update_positions(&self, documents: &[Document]) -> Result<Vec<Document>, StoreError> {
        let payload: Vec<DocumentPayload> = documents.iter().map(Document::to_payload).collect();
        debug!("PUT {} ({} documents)", self.batch_url, payload.len());
        self.put_batch(&payload).await.inspect_err(|e| {
            error!("Error updating document positions: {e}");
        })
    }
}
