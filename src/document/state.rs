//! Open document tracking for the language server.

use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use super::text::LineIndex;

/// State for a single open document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Pre-computed line index for position conversion.
    pub line_index: LineIndex,
}

impl DocumentState {
    pub fn new(source: String) -> Self {
        Self {
            line_index: LineIndex::new(source),
        }
    }

    pub fn source(&self) -> &str {
        self.line_index.source()
    }
}

/// Thread-safe storage for open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<DocumentState>>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open or replace a document with the given source text.
    pub fn open(&self, uri: Url, source: String) -> Arc<DocumentState> {
        let state = Arc::new(DocumentState::new(source));
        self.documents.insert(uri, Arc::clone(&state));
        state
    }

    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<DocumentState>> {
        self.documents.get(uri).map(|r| Arc::clone(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(path: &str) -> Url {
        Url::parse(&format!("file://{}", path)).unwrap()
    }

    #[test]
    fn open_get_close() {
        let store = DocumentStore::new();
        let a = uri("/tmp/a.cel");

        store.open(a.clone(), "size(x)".to_string());
        let doc = store.get(&a).unwrap();
        assert_eq!(doc.source(), "size(x)");

        store.open(a.clone(), "has(x.y)".to_string());
        assert_eq!(store.get(&a).unwrap().source(), "has(x.y)");
        // Readers holding the old snapshot keep seeing it.
        assert_eq!(doc.source(), "size(x)");

        store.close(&a);
        assert!(store.get(&a).is_none());
    }
}
