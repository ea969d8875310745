use std::time::Duration;

use fetchq_core::FetchError;

/// Raw answer of the reader service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

/// Answer of the rendering service after main-content extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub status: u16,
    /// Document `<title>`, when the rendered page had one.
    pub title: Option<String>,
    pub extracted_text: String,
}

/// Primary fetch backend: a remote reader service.
///
/// Non-2xx answers are returned as responses; only transport problems
/// (timeouts, connection errors, oversized bodies) are errors.
#[async_trait::async_trait]
pub trait ReaderBackend: Send + Sync {
    async fn request(&self, url: &str, timeout: Duration) -> Result<BackendResponse, FetchError>;
}

/// Fallback fetch backend: a headless-browser renderer.
#[async_trait::async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage, FetchError>;
}
