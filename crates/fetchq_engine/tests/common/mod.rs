#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use fetchq_core::{FailureKind, FetchError};
use fetchq_engine::{
    BackendResponse, ChainSettings, ReaderBackend, RenderBackend, RenderedPage, StrategyChain,
};

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
}

pub fn test_settings() -> ChainSettings {
    ChainSettings {
        primary_timeout: Duration::from_millis(200),
        fallback_timeout: Duration::from_millis(200),
        min_rendered_chars: 10,
        now: Arc::new(fixed_time),
    }
}

pub fn chain(reader: &Arc<FakeReader>, renderer: &Arc<FakeRenderer>) -> StrategyChain {
    StrategyChain::from_backends(reader.clone(), renderer.clone(), test_settings())
}

/// Reader backend with canned replies, a per-call delay and a call log.
pub struct FakeReader {
    default: Result<BackendResponse, FetchError>,
    routes: HashMap<String, Result<BackendResponse, FetchError>>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeReader {
    pub fn ok(body: &str) -> Self {
        Self::replying(Ok(BackendResponse {
            status: 200,
            body: body.to_string(),
        }))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::replying(Ok(BackendResponse {
            status,
            body: body.to_string(),
        }))
    }

    pub fn failing(kind: FailureKind) -> Self {
        Self::replying(Err(FetchError::new(kind, "reader failed")))
    }

    fn replying(default: Result<BackendResponse, FetchError>) -> Self {
        Self {
            default,
            routes: HashMap::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Ok(BackendResponse {
                status: 200,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn route_failure(mut self, url: &str, kind: FailureKind) -> Self {
        self.routes
            .insert(url.to_string(), Err(FetchError::new(kind, "reader failed")));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl ReaderBackend for FakeReader {
    async fn request(&self, url: &str, _timeout: Duration) -> Result<BackendResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.routes.get(url).unwrap_or(&self.default).clone()
    }
}

/// Render backend with a canned reply and a call counter.
pub struct FakeRenderer {
    reply: Result<RenderedPage, FetchError>,
    calls: AtomicUsize,
}

impl FakeRenderer {
    pub fn ok(title: Option<&str>, text: &str) -> Self {
        Self {
            reply: Ok(RenderedPage {
                status: 200,
                title: title.map(str::to_string),
                extracted_text: text.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: FailureKind) -> Self {
        Self {
            reply: Err(FetchError::new(kind, "renderer failed")),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl RenderBackend for FakeRenderer {
    async fn render(&self, _url: &str, _timeout: Duration) -> Result<RenderedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}
