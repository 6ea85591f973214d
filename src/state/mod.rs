use std::sync::Arc;

use crate::memory::MemoryStore;

/// Shared application state handed to every request handler.
///
/// The store is the only stateful component; it lives for the process
/// lifetime and is never torn down.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
