use std::sync::Arc;
use std::time::Duration;

use fetchq_core::{split_title, FailureKind, FetchError, TitledBody};

use crate::backend::{ReaderBackend, RenderBackend};

/// Rendered pages shorter than this are treated as failed extractions.
pub const MIN_RENDERED_CHARS: usize = 100;

/// Hosts whose pages are empty shells without JavaScript.
const JS_REQUIRED_PATTERNS: &[&str] = &[
    "claude.ai/share/",
    "chatgpt.com/share/",
    "chat.openai.com/share/",
];

const LOGIN_PAGE_INDICATORS: &[&str] = &[
    "Continue with Google",
    "Continue with email",
    "Log in",
    "Sign up",
    "Create an account",
];

const CHALLENGE_INDICATORS: &[&str] = &[
    "just a moment...",
    "verify you are human",
    "checking your browser",
    "enable javascript and cookies",
    "ray id:",
    "cloudflare",
];

/// One way of turning a URL into extracted text.
///
/// Implementations return `Ok` only with a non-empty body; every other
/// outcome is a [`FetchError`] so the chain can move on.
#[async_trait::async_trait]
pub trait FetchStrategy: Send + Sync {
    async fn attempt(&self, url: &str, timeout: Duration) -> Result<TitledBody, FetchError>;
}

pub fn requires_rendering(url: &str) -> bool {
    JS_REQUIRED_PATTERNS
        .iter()
        .any(|pattern| url.contains(pattern))
}

/// Two or more login-wall markers.
pub fn looks_like_login_page(content: &str) -> bool {
    LOGIN_PAGE_INDICATORS
        .iter()
        .filter(|indicator| content.contains(*indicator))
        .count()
        >= 2
}

/// Two or more bot-challenge markers, case-insensitive.
pub fn looks_like_challenge(content: &str) -> bool {
    let lower = content.to_lowercase();
    CHALLENGE_INDICATORS
        .iter()
        .filter(|indicator| lower.contains(*indicator))
        .count()
        >= 2
}

fn check_status(status: u16) -> Result<(), FetchError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(FetchError::new(
            FailureKind::HttpStatus(status),
            format!("backend answered {status}"),
        ))
    }
}

pub struct ReaderStrategy {
    backend: Arc<dyn ReaderBackend>,
}

impl ReaderStrategy {
    pub fn new(backend: Arc<dyn ReaderBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl FetchStrategy for ReaderStrategy {
    async fn attempt(&self, url: &str, timeout: Duration) -> Result<TitledBody, FetchError> {
        if requires_rendering(url) {
            return Err(FetchError::new(
                FailureKind::RenderingRequired,
                "host needs a browser",
            ));
        }

        let response = self.backend.request(url, timeout).await?;
        check_status(response.status)?;
        if looks_like_login_page(&response.body) {
            return Err(FetchError::new(
                FailureKind::Blocked,
                "got login page instead of content",
            ));
        }

        let extracted = split_title(&response.body);
        if extracted.body.trim().is_empty() {
            return Err(FetchError::new(
                FailureKind::EmptyExtraction,
                "reader returned no content",
            ));
        }
        Ok(extracted)
    }
}

pub struct RenderStrategy {
    backend: Arc<dyn RenderBackend>,
    min_chars: usize,
}

impl RenderStrategy {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            min_chars: MIN_RENDERED_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }
}

#[async_trait::async_trait]
impl FetchStrategy for RenderStrategy {
    async fn attempt(&self, url: &str, timeout: Duration) -> Result<TitledBody, FetchError> {
        let page = self.backend.render(url, timeout).await?;
        check_status(page.status)?;

        let text = page.extracted_text.trim();
        if text.is_empty() || text.chars().count() < self.min_chars {
            return Err(FetchError::new(
                FailureKind::EmptyExtraction,
                format!("rendered content shorter than {} chars", self.min_chars),
            ));
        }
        if looks_like_challenge(text) || page.title.as_deref() == Some("Just a moment...") {
            return Err(FetchError::new(
                FailureKind::Blocked,
                "blocked by bot challenge",
            ));
        }

        match page.title {
            Some(title) => Ok(TitledBody {
                title: Some(title),
                body: text.to_string(),
            }),
            None => Ok(split_title(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{looks_like_challenge, looks_like_login_page, requires_rendering};

    #[test]
    fn chat_share_links_need_rendering() {
        assert!(requires_rendering("https://claude.ai/share/abc"));
        assert!(requires_rendering("https://chatgpt.com/share/abc"));
        assert!(!requires_rendering("https://example.com/share/abc"));
    }

    #[test]
    fn single_marker_is_not_a_login_wall() {
        assert!(!looks_like_login_page("Article text. Log in to comment."));
        assert!(looks_like_login_page("Log in\nSign up\nContinue with Google"));
    }

    #[test]
    fn challenge_detection_is_case_insensitive() {
        assert!(looks_like_challenge("Just a moment...\nChecking your browser"));
        assert!(!looks_like_challenge("Cloudflare published a postmortem."));
    }
}
