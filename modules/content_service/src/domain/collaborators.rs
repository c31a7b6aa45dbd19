//! Traits for systems the service consumes but does not implement

use async_trait::async_trait;

/// Media library lookups (uploads, storage and thumbnailing live elsewhere)
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Whether a media identifier resolves to a stored asset
    async fn exists(&self, media_id: &str) -> anyhow::Result<bool>;
}

/// Accepts every identifier
pub struct NoOpMediaLibrary;

#[async_trait]
impl MediaLibrary for NoOpMediaLibrary {
    async fn exists(&self, _media_id: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// HTML sanitiser applied to `rich_text` values before storage
pub trait RichTextSanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Returns input unchanged
pub struct PassthroughSanitizer;

impl RichTextSanitizer for PassthroughSanitizer {
    fn sanitize(&self, html: &str) -> String {
        html.to_string()
    }
}
