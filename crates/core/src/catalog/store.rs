//! Session-wide catalog cache.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::CatalogItem;
use crate::metrics::CATALOG_FETCHES;
use crate::notice::NoticeHandle;
use crate::store::{CatalogSource, StoreError};

/// Holds the full catalog, fetched once per session.
///
/// `load` fetches only while the local list is empty; a non-empty catalog is
/// never refetched. Concurrent loads share one fetch.
pub struct CatalogStore {
    source: Arc<dyn CatalogSource>,
    items: watch::Sender<Arc<Vec<CatalogItem>>>,
    loading: Mutex<()>,
    notices: NoticeHandle,
}

impl CatalogStore {
    pub fn new(source: Arc<dyn CatalogSource>, notices: NoticeHandle) -> Self {
        Self {
            source,
            items: watch::Sender::new(Arc::new(Vec::new())),
            loading: Mutex::new(()),
            notices,
        }
    }

    /// Fetch the catalog unless it is already loaded.
    ///
    /// On failure a notice is emitted and the local list stays as it was.
    pub async fn load(&self) -> Result<Arc<Vec<CatalogItem>>, StoreError> {
        let _guard = self.loading.lock().await;

        let current = self.items();
        if !current.is_empty() {
            return Ok(current);
        }

        match self.source.fetch_all().await {
            Ok(items) => {
                CATALOG_FETCHES.with_label_values(&["ok"]).inc();
                tracing::info!(count = items.len(), "Loaded catalog");
                let items = Arc::new(items);
                self.items.send_replace(Arc::clone(&items));
                Ok(items)
            }
            Err(e) => {
                CATALOG_FETCHES.with_label_values(&["error"]).inc();
                tracing::warn!(error = %e, "Failed to load catalog");
                self.notices.error("Failed to load catalog");
                Err(e)
            }
        }
    }

    /// Current snapshot. Empty until the first successful load.
    pub fn items(&self) -> Arc<Vec<CatalogItem>> {
        Arc::clone(&self.items.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<CatalogItem>>> {
        self.items.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<CatalogItem> {
        self.items.borrow().iter().find(|item| item.id == id).cloned()
    }

    pub fn is_loaded(&self) -> bool {
        !self.items.borrow().is_empty()
    }
}
