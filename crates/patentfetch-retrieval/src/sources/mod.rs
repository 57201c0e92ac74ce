//! Patent page sources.

pub mod google_patents;

use async_trait::async_trait;
use crate::error::RetrievalError;

/// Common interface for anything that can map a normalised token to the URL
/// of its PDF.
#[async_trait]
pub trait PatentSource: Send + Sync {
    /// URL of the detail page for `token`.
    fn detail_url(&self, token: &str) -> String;

    /// Resolve the PDF asset URL for a normalised token.
    ///
    /// Every failure mode (transport, status, missing link) comes back as
    /// [`RetrievalError::NotFound`] carrying the cause.
    async fn resolve_pdf_url(&self, token: &str) -> Result<String, RetrievalError>;
}
