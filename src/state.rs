use std::sync::Arc;

use crate::media::MediaStore;
use crate::store::DocumentStore;

/// Shared application state: the document store and the media store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub media: Arc<MediaStore>,
}

impl AppState {
    pub fn new(store: DocumentStore, media: MediaStore) -> Self {
        Self {
            store: Arc::new(store),
            media: Arc::new(media),
        }
    }
}
