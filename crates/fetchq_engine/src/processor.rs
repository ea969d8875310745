//! Queue Processor: one sequential pass over the pending queue.
//!
//! Per item: `Pending -> Parsing -> Fetching -> Composing -> Committed`, or
//! `Skipped` from `Parsing`/`Fetching`. Skipped items are removed from the
//! queue; there is no retry. A committed document is written before its
//! queue item is deleted, so a crash in between leaves the item pending and
//! the next run commits it again (a possible duplicate document, never a
//! lost one). A failed write leaves the item pending as well.

use std::fmt;
use std::sync::Arc;

use fetchq_core::{compose, parse, FetchFailure, FetchRequest, ParseError, QueueItem, Strategy};
use fetchq_logging::{fetchq_debug, fetchq_error, fetchq_info, fetchq_warn};

use crate::chain::StrategyChain;
use crate::document_store::{CommitError, DocumentStore};
use crate::filename::document_key;
use crate::queue_store::QueueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Pending,
    Parsing,
    Fetching,
    Composing,
    Committed,
    Skipped,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStage::Pending => "pending",
            ItemStage::Parsing => "parsing",
            ItemStage::Fetching => "fetching",
            ItemStage::Composing => "composing",
            ItemStage::Committed => "committed",
            ItemStage::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Terminal-per-item error that causes a skip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error(transparent)]
    Commit(#[from] CommitError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub document_key: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Committed {
        document_key: String,
        strategy: Strategy,
        /// Set when the document was written but the item could not be deleted.
        removal_error: Option<CommitError>,
    },
    Skipped {
        /// `Parsing` or `Fetching`.
        stage: ItemStage,
        error: ItemError,
        removal_error: Option<CommitError>,
    },
    /// The document write failed; the item stays pending for the next run.
    Retained { error: CommitError },
}

impl ItemOutcome {
    pub fn final_stage(&self) -> ItemStage {
        match self {
            ItemOutcome::Committed { .. } => ItemStage::Committed,
            ItemOutcome::Skipped { .. } => ItemStage::Skipped,
            ItemOutcome::Retained { .. } => ItemStage::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub id: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingReport {
    /// In processing (receipt) order.
    pub items: Vec<ItemReport>,
    /// Set when the queue could not be listed; no item was touched.
    pub listing_error: Option<String>,
}

impl ProcessingReport {
    pub fn committed(&self) -> usize {
        self.count(ItemStage::Committed)
    }

    pub fn skipped(&self) -> usize {
        self.count(ItemStage::Skipped)
    }

    pub fn retained(&self) -> usize {
        self.count(ItemStage::Pending)
    }

    pub fn has_failures(&self) -> bool {
        self.listing_error.is_some() || self.skipped() > 0 || self.retained() > 0
    }

    pub fn outcome(&self, id: &str) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.outcome)
    }

    fn count(&self, stage: ItemStage) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome.final_stage() == stage)
            .count()
    }
}

pub struct QueueProcessor {
    queue: Arc<dyn QueueStore>,
    documents: Arc<dyn DocumentStore>,
    chain: StrategyChain,
}

impl QueueProcessor {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        documents: Arc<dyn DocumentStore>,
        chain: StrategyChain,
    ) -> Self {
        Self {
            queue,
            documents,
            chain,
        }
    }

    /// Drain the queue once. Never fails: every problem ends up in the report.
    pub async fn run_once(&self) -> ProcessingReport {
        let items = match self.queue.pending() {
            Ok(items) => items,
            Err(err) => {
                fetchq_error!("failed to list queue: {}", err);
                return ProcessingReport {
                    items: Vec::new(),
                    listing_error: Some(err.to_string()),
                };
            }
        };
        fetchq_info!("processing {} queue item(s)", items.len());

        let mut report = ProcessingReport::default();
        for item in &items {
            let outcome = self.process_item(item).await;
            report.items.push(ItemReport {
                id: item.id.clone(),
                outcome,
            });
        }
        fetchq_info!(
            "run finished: {} committed, {} skipped, {} retained",
            report.committed(),
            report.skipped(),
            report.retained()
        );
        report
    }

    /// Fetch, compose and write one request. Used for queue items and for
    /// single-URL dispatch; `key_seed` is what the document key is derived from.
    pub async fn materialize(
        &self,
        request: &FetchRequest,
        key_seed: &str,
    ) -> Result<Committed, MaterializeError> {
        let fetched = self.chain.fetch(&request.url).await.into_result()?;

        fetchq_debug!("{}: {} -> {}", key_seed, ItemStage::Fetching, ItemStage::Composing);
        let doc = compose(request, &fetched);
        let key = document_key(key_seed, fetched.fetched_at);
        self.documents.write(&key, &doc)?;

        Ok(Committed {
            document_key: key,
            strategy: fetched.strategy,
        })
    }

    async fn process_item(&self, item: &QueueItem) -> ItemOutcome {
        fetchq_debug!("{}: {} -> {}", item.id, ItemStage::Pending, ItemStage::Parsing);
        let request = match parse(&item.raw_payload) {
            Ok(request) => request,
            Err(err) => {
                fetchq_warn!("{}: skipped, parse error: {}", item.id, err);
                return self.skip(item, ItemStage::Parsing, err.into());
            }
        };

        fetchq_debug!("{}: {} -> {} {}", item.id, ItemStage::Parsing, ItemStage::Fetching, request.url);
        match self.materialize(&request, &item.id).await {
            Ok(committed) => {
                fetchq_info!(
                    "{}: committed {} via {} strategy",
                    item.id,
                    committed.document_key,
                    committed.strategy
                );
                ItemOutcome::Committed {
                    removal_error: self.remove(item).err(),
                    document_key: committed.document_key,
                    strategy: committed.strategy,
                }
            }
            Err(MaterializeError::Fetch(failure)) => {
                fetchq_warn!("{}: skipped {}: {}", item.id, request.url, failure);
                self.skip(item, ItemStage::Fetching, failure.into())
            }
            Err(MaterializeError::Commit(error)) => {
                fetchq_warn!("{}: left pending: {}", item.id, error);
                ItemOutcome::Retained { error }
            }
        }
    }

    fn skip(&self, item: &QueueItem, stage: ItemStage, error: ItemError) -> ItemOutcome {
        ItemOutcome::Skipped {
            stage,
            error,
            removal_error: self.remove(item).err(),
        }
    }

    fn remove(&self, item: &QueueItem) -> Result<(), CommitError> {
        self.queue.remove(&item.id).map_err(|err| {
            fetchq_error!(
                "{}: could not remove queue item, it will be processed again: {}",
                item.id,
                err
            );
            CommitError::RemoveFailed {
                id: item.id.clone(),
                message: err.to_string(),
            }
        })
    }
}
