mod common;

use std::fs;
use std::sync::Arc;

use common::{chain, FakeReader, FakeRenderer};
use fetchq_core::{FailureKind, OutputDocument, ParseError, QueueItem, Strategy};
use fetchq_engine::{
    CommitError, DirDocumentStore, DirQueueStore, DocumentStore, ItemError, ItemOutcome,
    ItemStage, MemoryDocumentStore, MemoryQueueStore, QueueError, QueueProcessor, QueueStore,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct FailingDocumentStore;

impl DocumentStore for FailingDocumentStore {
    fn write(&self, key: &str, _doc: &OutputDocument) -> Result<(), CommitError> {
        Err(CommitError::WriteFailed {
            key: key.to_string(),
            message: "disk full".into(),
        })
    }
}

/// Lists items but refuses to delete them.
struct StickyQueue(MemoryQueueStore);

impl QueueStore for StickyQueue {
    fn pending(&self) -> Result<Vec<QueueItem>, QueueError> {
        self.0.pending()
    }

    fn enqueue(&self, id: &str, payload: &[u8]) -> Result<(), QueueError> {
        self.0.enqueue(id, payload)
    }

    fn remove(&self, id: &str) -> Result<(), QueueError> {
        Err(QueueError::InvalidId(id.to_string()))
    }
}

struct BrokenQueue;

impl QueueStore for BrokenQueue {
    fn pending(&self) -> Result<Vec<QueueItem>, QueueError> {
        Err(QueueError::Io(std::io::Error::other("unreadable")))
    }

    fn enqueue(&self, _id: &str, _payload: &[u8]) -> Result<(), QueueError> {
        Ok(())
    }

    fn remove(&self, _id: &str) -> Result<(), QueueError> {
        Ok(())
    }
}

fn processor(
    queue: &MemoryQueueStore,
    documents: Arc<dyn DocumentStore>,
    reader: FakeReader,
) -> (QueueProcessor, Arc<FakeReader>) {
    let reader = reader.arc();
    let renderer = FakeRenderer::failing(FailureKind::Unavailable).arc();
    let processor = QueueProcessor::new(
        Arc::new(queue.clone()),
        documents,
        chain(&reader, &renderer),
    );
    (processor, reader)
}

#[tokio::test]
async fn bare_url_item_is_committed_and_removed() {
    let queue = MemoryQueueStore::new();
    queue.enqueue("a.txt", b"https://example.com/a").unwrap();
    let documents = MemoryDocumentStore::new();
    let (processor, _) = processor(
        &queue,
        Arc::new(documents.clone()),
        FakeReader::ok("Title\nHello"),
    );

    let report = processor.run_once().await;

    assert_eq!(
        report.outcome("a.txt"),
        Some(&ItemOutcome::Committed {
            document_key: "2024-01-02T030405-a--18b7cb09.md".into(),
            strategy: Strategy::Primary,
            removal_error: None,
        })
    );
    assert!(queue.is_empty());
    assert_eq!(
        documents.get("2024-01-02T030405-a--18b7cb09.md").unwrap(),
        "---\nurl: https://example.com/a\ntitle: \"Title\"\nfetched_at: 2024-01-02T03:04:05Z\n---\n\n# Title\n\nHello\n"
    );
    assert!(!report.has_failures());
}

#[tokio::test]
async fn ids_with_the_same_stem_keep_separate_documents() {
    let queue = MemoryQueueStore::new();
    queue.enqueue("a.txt", b"https://example.com/one").unwrap();
    queue.enqueue("a.md", b"https://example.com/two").unwrap();
    let documents = MemoryDocumentStore::new();
    let (processor, _) = processor(
        &queue,
        Arc::new(documents.clone()),
        FakeReader::ok("Title\nHello"),
    );

    let report = processor.run_once().await;

    assert_eq!(report.committed(), 2);
    assert!(queue.is_empty());
    assert_eq!(documents.len(), 2);
    let one = documents.get("2024-01-02T030405-a--18b7cb09.md").unwrap();
    let two = documents.get("2024-01-02T030405-a--fecccc97.md").unwrap();
    assert!(one.contains("url: https://example.com/one\n"));
    assert!(two.contains("url: https://example.com/two\n"));
}

#[tokio::test]
async fn payload_without_url_is_skipped_and_removed() {
    let queue = MemoryQueueStore::new();
    queue.enqueue("junk.txt", b"no link in here\n\nat all").unwrap();
    let documents = MemoryDocumentStore::new();
    let (processor, reader) = processor(
        &queue,
        Arc::new(documents.clone()),
        FakeReader::ok("Title\nHello"),
    );

    let report = processor.run_once().await;

    assert_eq!(
        report.outcome("junk.txt"),
        Some(&ItemOutcome::Skipped {
            stage: ItemStage::Parsing,
            error: ItemError::Parse(ParseError::NoUrlFound),
            removal_error: None,
        })
    );
    assert!(queue.is_empty());
    assert!(documents.is_empty());
    assert_eq!(reader.calls(), 0);
    assert_eq!(report.skipped(), 1);
}

#[tokio::test]
async fn exhausted_chain_skips_item_and_run_continues() {
    let queue = MemoryQueueStore::new();
    queue.enqueue("1-bad", b"https://example.com/bad").unwrap();
    queue.enqueue("2-good", b"https://example.com/good").unwrap();
    let documents = MemoryDocumentStore::new();
    let reader = FakeReader::ok("Good\nBody").route_failure("https://example.com/bad", FailureKind::Timeout);
    let (processor, _) = processor(&queue, Arc::new(documents.clone()), reader);

    let report = processor.run_once().await;

    match report.outcome("1-bad") {
        Some(ItemOutcome::Skipped {
            stage: ItemStage::Fetching,
            error: ItemError::Fetch(failure),
            ..
        }) => {
            assert_eq!(failure.attempted, vec![Strategy::Primary, Strategy::Fallback]);
            assert_eq!(failure.last_error.kind, FailureKind::Unavailable);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(report.outcome("2-good").map(ItemOutcome::final_stage), Some(ItemStage::Committed));
    assert!(queue.is_empty());
    assert_eq!(documents.len(), 1);
}

#[tokio::test]
async fn write_failure_keeps_item_pending() {
    let queue = MemoryQueueStore::new();
    queue.enqueue("a.txt", b"https://example.com/a").unwrap();
    let (processor, _) = processor(
        &queue,
        Arc::new(FailingDocumentStore),
        FakeReader::ok("Title\nHello"),
    );

    let report = processor.run_once().await;

    assert!(matches!(
        report.outcome("a.txt"),
        Some(ItemOutcome::Retained {
            error: CommitError::WriteFailed { .. }
        })
    ));
    assert!(queue.contains("a.txt"));
    assert_eq!(report.retained(), 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn items_are_processed_in_receipt_order() {
    let queue = MemoryQueueStore::new();
    for (id, url) in [
        ("c", "https://example.com/3"),
        ("a", "https://example.com/1"),
        ("b", "https://example.com/2"),
    ] {
        queue.enqueue(id, url.as_bytes()).unwrap();
    }
    let (processor, reader) = processor(
        &queue,
        Arc::new(MemoryDocumentStore::new()),
        FakeReader::ok("Title\nHello"),
    );

    let report = processor.run_once().await;

    let ids: Vec<_> = report.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(
        reader.seen(),
        vec![
            "https://example.com/3".to_string(),
            "https://example.com/1".to_string(),
            "https://example.com/2".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_delete_after_commit_is_reported() {
    let inner = MemoryQueueStore::new();
    inner.enqueue("a.txt", b"https://example.com/a").unwrap();
    let documents = MemoryDocumentStore::new();
    let reader = FakeReader::ok("Title\nHello").arc();
    let renderer = FakeRenderer::failing(FailureKind::Unavailable).arc();
    let processor = QueueProcessor::new(
        Arc::new(StickyQueue(inner.clone())),
        Arc::new(documents.clone()),
        chain(&reader, &renderer),
    );

    let report = processor.run_once().await;

    assert!(matches!(
        report.outcome("a.txt"),
        Some(ItemOutcome::Committed {
            removal_error: Some(CommitError::RemoveFailed { .. }),
            ..
        })
    ));
    assert_eq!(documents.len(), 1);
    assert!(inner.contains("a.txt"));
}

#[tokio::test]
async fn listing_failure_is_carried_in_report() {
    let reader = FakeReader::ok("Title\nHello").arc();
    let renderer = FakeRenderer::failing(FailureKind::Unavailable).arc();
    let processor = QueueProcessor::new(
        Arc::new(BrokenQueue),
        Arc::new(MemoryDocumentStore::new()),
        chain(&reader, &renderer),
    );

    let report = processor.run_once().await;

    assert!(report.items.is_empty());
    assert!(report.listing_error.is_some());
    assert!(report.has_failures());
}

#[tokio::test]
async fn directory_stores_end_to_end() {
    let temp = TempDir::new().unwrap();
    let queue_dir = temp.path().join("queue");
    let output_dir = temp.path().join("output");
    fs::create_dir_all(&queue_dir).unwrap();
    fs::write(queue_dir.join(".gitkeep"), "").unwrap();
    fs::write(
        queue_dir.join("note.txt"),
        "https://example.com/a\n\nfirst line\nsecond line",
    )
    .unwrap();

    let reader = FakeReader::ok("Title\nHello").arc();
    let renderer = FakeRenderer::failing(FailureKind::Unavailable).arc();
    let documents = DirDocumentStore::new(output_dir.clone());
    let processor = QueueProcessor::new(
        Arc::new(DirQueueStore::new(queue_dir.clone())),
        Arc::new(documents.clone()),
        chain(&reader, &renderer),
    );

    let report = processor.run_once().await;

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.committed(), 1);
    assert!(!queue_dir.join("note.txt").exists());
    assert!(queue_dir.join(".gitkeep").exists());

    let written = fs::read_to_string(documents.path_for("2024-01-02T030405-note--59700155.md")).unwrap();
    assert!(written.contains("url: https://example.com/a\n"));
    assert!(written.contains("source_note: \"first line\\nsecond line\"\n"));
    assert!(written.ends_with("# Title\n\nHello\n"));
}
