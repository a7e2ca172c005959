// External document cache
//
// Every document taking part in a conversion lives here exactly once, keyed
// by its canonical path. Failed loads are remembered too.

use crate::parser::{Document, EcoreParser};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Index of a document in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub usize);

/// Loads and memoizes metamodel documents
#[derive(Debug, Default)]
pub struct DocumentCache {
    parser: EcoreParser,
    documents: Vec<Document>,
    by_path: HashMap<PathBuf, DocumentId>,
    failures: HashMap<PathBuf, String>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already parsed document (the conversion input)
    pub fn insert(&mut self, document: Document) -> DocumentId {
        let key = cache_key(&document.path);
        if let Some(&id) = self.by_path.get(&key) {
            return id;
        }
        let id = DocumentId(self.documents.len());
        self.documents.push(document);
        self.by_path.insert(key, id);
        id
    }

    /// Load a document, parsing it only on first request.
    ///
    /// Failures are returned as messages and memoized per path.
    pub fn load(&mut self, path: &Path) -> Result<DocumentId, String> {
        let key = cache_key(path);
        if let Some(&id) = self.by_path.get(&key) {
            trace!(path = %path.display(), "Document cache hit");
            return Ok(id);
        }
        if let Some(message) = self.failures.get(&key) {
            trace!(path = %path.display(), "Document cache hit (failed load)");
            return Err(message.clone());
        }

        debug!(path = %path.display(), "Loading foreign metamodel");
        match self.parser.parse_file(path) {
            Ok(document) => {
                let id = DocumentId(self.documents.len());
                self.documents.push(document);
                self.by_path.insert(key, id);
                Ok(id)
            }
            Err(e) => {
                let message = e.to_string();
                self.failures.insert(key, message.clone());
                Err(message)
            }
        }
    }

    /// Id of an already cached document, without loading anything
    pub fn lookup(&self, path: &Path) -> Option<DocumentId> {
        self.by_path.get(&cache_key(path)).copied()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    /// Number of successfully loaded documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of paths that failed to load
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
