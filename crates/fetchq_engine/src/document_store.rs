use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use fetchq_core::{build_markdown_document, OutputDocument};

use crate::persist::AtomicFileWriter;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    #[error("failed to write document {key}: {message}")]
    WriteFailed { key: String, message: String },
    /// The document was written but the queue item is still pending; the
    /// next run will commit it again.
    #[error("failed to remove queue item {id} after commit: {message}")]
    RemoveFailed { id: String, message: String },
}

/// Keyed write-once store of serialised documents.
pub trait DocumentStore: Send + Sync {
    fn write(&self, key: &str, doc: &OutputDocument) -> Result<(), CommitError>;
}

/// Writes `{dir}/{key}` atomically as markdown with front-matter.
#[derive(Debug, Clone)]
pub struct DirDocumentStore {
    writer: AtomicFileWriter,
}

impl DirDocumentStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.writer.dir().join(key)
    }
}

impl DocumentStore for DirDocumentStore {
    fn write(&self, key: &str, doc: &OutputDocument) -> Result<(), CommitError> {
        self.writer
            .write(key, &build_markdown_document(doc))
            .map(|_| ())
            .map_err(|err| CommitError::WriteFailed {
                key: key.to_string(),
                message: err.to_string(),
            })
    }
}

/// In-memory document store keyed by document key. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn write(&self, key: &str, doc: &OutputDocument) -> Result<(), CommitError> {
        self.lock()
            .insert(key.to_string(), build_markdown_document(doc));
        Ok(())
    }
}
