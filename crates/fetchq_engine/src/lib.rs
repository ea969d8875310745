//! Fetchq engine: fetch backends, the strategy chain, stores and the queue processor.
mod backend;
mod chain;
mod document_store;
mod extract;
mod filename;
mod persist;
mod processor;
mod queue_store;
mod reader;
mod render;
mod strategy;

pub use backend::{BackendResponse, ReaderBackend, RenderBackend, RenderedPage};
pub use chain::{ChainSettings, Clock, StrategyChain};
pub use document_store::{CommitError, DirDocumentStore, DocumentStore, MemoryDocumentStore};
pub use extract::{extract_page, ExtractedPage};
pub use filename::{document_key, slugify};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use processor::{
    Committed, ItemError, ItemOutcome, ItemReport, ItemStage, MaterializeError,
    ProcessingReport, QueueProcessor,
};
pub use queue_store::{DirQueueStore, MemoryQueueStore, QueueError, QueueStore};
pub use reader::{ReaderSettings, ReqwestReader};
pub use render::{HttpRenderBackend, RenderSettings};
pub use strategy::{
    looks_like_challenge, looks_like_login_page, requires_rendering, FetchStrategy,
    ReaderStrategy, RenderStrategy, MIN_RENDERED_CHARS,
};
