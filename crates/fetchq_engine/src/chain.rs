use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fetchq_core::{
    FailureKind, FetchError, FetchFailure, FetchResult, FetchedContent, Strategy,
};
use fetchq_logging::{fetchq_debug, fetchq_info, fetchq_warn};

use crate::backend::{ReaderBackend, RenderBackend};
use crate::strategy::{FetchStrategy, ReaderStrategy, RenderStrategy, MIN_RENDERED_CHARS};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct ChainSettings {
    pub primary_timeout: Duration,
    pub fallback_timeout: Duration,
    pub min_rendered_chars: usize,
    /// Source of `fetched_at` stamps.
    pub now: Clock,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            primary_timeout: Duration::from_secs(30),
            fallback_timeout: Duration::from_secs(60),
            min_rendered_chars: MIN_RENDERED_CHARS,
            now: Arc::new(Utc::now),
        }
    }
}

struct Slot {
    strategy: Strategy,
    timeout: Duration,
    inner: Box<dyn FetchStrategy>,
}

/// Fetch Strategy Chain: `[Primary, Fallback]`, first success wins.
///
/// Each strategy runs at most once per call under its own timeout.
pub struct StrategyChain {
    slots: Vec<Slot>,
    now: Clock,
}

impl StrategyChain {
    pub fn new(
        primary: Box<dyn FetchStrategy>,
        fallback: Box<dyn FetchStrategy>,
        settings: ChainSettings,
    ) -> Self {
        Self {
            slots: vec![
                Slot {
                    strategy: Strategy::Primary,
                    timeout: settings.primary_timeout,
                    inner: primary,
                },
                Slot {
                    strategy: Strategy::Fallback,
                    timeout: settings.fallback_timeout,
                    inner: fallback,
                },
            ],
            now: settings.now,
        }
    }

    /// Reader service first, renderer second.
    pub fn from_backends(
        reader: Arc<dyn ReaderBackend>,
        renderer: Arc<dyn RenderBackend>,
        settings: ChainSettings,
    ) -> Self {
        let fallback = RenderStrategy::new(renderer).with_min_chars(settings.min_rendered_chars);
        Self::new(
            Box::new(ReaderStrategy::new(reader)),
            Box::new(fallback),
            settings,
        )
    }

    /// Never panics and never returns an error: exhaustion is the
    /// [`FetchResult::Failure`] variant.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut attempted = Vec::with_capacity(self.slots.len());
        let mut last_error = None;

        for slot in &self.slots {
            attempted.push(slot.strategy);
            fetchq_debug!("{} strategy attempting {}", slot.strategy, url);

            let outcome =
                match tokio::time::timeout(slot.timeout, slot.inner.attempt(url, slot.timeout))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(FetchError::new(
                        FailureKind::Timeout,
                        format!("no answer within {:?}", slot.timeout),
                    )),
                };

            match outcome {
                Ok(extracted) if !extracted.body.trim().is_empty() => {
                    fetchq_info!("{} strategy fetched {}", slot.strategy, url);
                    return FetchResult::Success(FetchedContent {
                        strategy: slot.strategy,
                        title: extracted.title,
                        body: extracted.body,
                        fetched_at: (self.now)(),
                    });
                }
                Ok(_) => {
                    fetchq_warn!("{} strategy returned empty content for {}", slot.strategy, url);
                    last_error = Some(FetchError::new(
                        FailureKind::EmptyExtraction,
                        "strategy returned empty content",
                    ));
                }
                Err(err) => {
                    fetchq_warn!("{} strategy failed for {}: {}", slot.strategy, url, err);
                    last_error = Some(err);
                }
            }
        }

        FetchResult::Failure(FetchFailure {
            attempted,
            last_error: last_error.unwrap_or_else(|| {
                FetchError::new(FailureKind::Unavailable, "no strategies configured")
            }),
        })
    }
}
