use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use fetchq_core::QueueItem;
use fetchq_logging::{fetchq_debug, fetchq_warn};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("invalid queue item id {0:?}")]
    InvalidId(String),
    #[error("queue item {0:?} not found")]
    NotFound(String),
}

/// Keyed, append-accepting, delete-capable collection of pending payloads.
///
/// Callers guarantee at most one processing pass runs against a store at a time.
pub trait QueueStore: Send + Sync {
    /// Pending items in receipt order; `received_order` is the position in that order.
    fn pending(&self) -> Result<Vec<QueueItem>, QueueError>;
    fn enqueue(&self, id: &str, payload: &[u8]) -> Result<(), QueueError>;
    fn remove(&self, id: &str) -> Result<(), QueueError>;
}

fn validate_id(id: &str) -> Result<(), QueueError> {
    let is_plain_name = !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(&['/', '\\'][..])
        && Path::new(id).file_name().is_some_and(|name| name == id);
    if is_plain_name {
        Ok(())
    } else {
        Err(QueueError::InvalidId(id.to_string()))
    }
}

/// Queue backed by a directory: one regular file per item, the id is the filename.
///
/// Dotfiles (such as `.gitkeep`) are ignored. Receipt order is modification
/// time, ties broken by name.
#[derive(Debug, Clone)]
pub struct DirQueueStore {
    dir: PathBuf,
    writer: AtomicFileWriter,
}

impl DirQueueStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl QueueStore for DirQueueStore {
    fn pending(&self) -> Result<Vec<QueueItem>, QueueError> {
        if !self.dir.exists() {
            fetchq_warn!("queue directory {:?} does not exist", self.dir);
            return Ok(Vec::new());
        }

        let mut entries: Vec<(SystemTime, String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, name, entry.path()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut items = Vec::with_capacity(entries.len());
        for (_, id, path) in entries {
            match fs::read(&path) {
                Ok(raw_payload) => items.push(QueueItem {
                    id,
                    raw_payload,
                    received_order: items.len(),
                }),
                Err(err) => fetchq_warn!("skipping unreadable queue file {:?}: {}", path, err),
            }
        }
        fetchq_debug!("{} pending item(s) in {:?}", items.len(), self.dir);
        Ok(items)
    }

    fn enqueue(&self, id: &str, payload: &[u8]) -> Result<(), QueueError> {
        validate_id(id)?;
        self.writer.write_bytes(id, payload)?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), QueueError> {
        validate_id(id)?;
        match fs::remove_file(self.dir.join(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(QueueError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory queue in insertion order. Clones share the same items.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueueStore {
    items: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|(item_id, _)| item_id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl QueueStore for MemoryQueueStore {
    fn pending(&self) -> Result<Vec<QueueItem>, QueueError> {
        Ok(self
            .lock()
            .iter()
            .enumerate()
            .map(|(received_order, (id, payload))| QueueItem {
                id: id.clone(),
                raw_payload: payload.clone(),
                received_order,
            })
            .collect())
    }

    fn enqueue(&self, id: &str, payload: &[u8]) -> Result<(), QueueError> {
        validate_id(id)?;
        let mut items = self.lock();
        match items.iter_mut().find(|(item_id, _)| item_id == id) {
            Some((_, existing)) => *existing = payload.to_vec(),
            None => items.push((id.to_string(), payload.to_vec())),
        }
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), QueueError> {
        let mut items = self.lock();
        let position = items
            .iter()
            .position(|(item_id, _)| item_id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        items.remove(position);
        Ok(())
    }
}
