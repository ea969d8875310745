use std::fmt;

use chrono::{DateTime, Utc};

/// One pending payload in the queue store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Derived from the source filename; unique within a pending batch.
    pub id: String,
    pub raw_payload: Vec<u8>,
    pub received_order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub note: Option<String>,
    pub tags: Vec<String>,
}

impl FetchRequest {
    pub fn bare(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            note: None,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Remote reader service.
    Primary,
    /// Headless-browser rendering service.
    Fallback,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Primary => write!(f, "primary"),
            Strategy::Fallback => write!(f, "fallback"),
        }
    }
}

/// Successful outcome of one strategy. `body` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub strategy: Strategy,
    pub title: Option<String>,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success(FetchedContent),
    Failure(FetchFailure),
}

impl FetchResult {
    pub fn into_result(self) -> Result<FetchedContent, FetchFailure> {
        match self {
            FetchResult::Success(content) => Ok(content),
            FetchResult::Failure(failure) => Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }
}

/// Every strategy failed. `attempted` keeps invocation order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("all strategies exhausted (attempted: {}); last error: {last_error}", join_strategies(.attempted))]
pub struct FetchFailure {
    pub attempted: Vec<Strategy>,
    pub last_error: FetchError,
}

fn join_strategies(strategies: &[Strategy]) -> String {
    strategies
        .iter()
        .map(Strategy::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    EmptyExtraction,
    HttpStatus(u16),
    Network,
    /// Login wall or bot challenge instead of content.
    Blocked,
    /// Host is known to serve nothing without a browser.
    RenderingRequired,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// Backend not configured.
    Unavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::EmptyExtraction => write!(f, "empty extraction"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Blocked => write!(f, "blocked"),
            FailureKind::RenderingRequired => write!(f, "rendering required"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Unavailable => write!(f, "backend unavailable"),
        }
    }
}

/// Terminal output of a committed item. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    pub url: String,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
    pub source_note: Option<String>,
    pub tags: Vec<String>,
    pub body: String,
}
