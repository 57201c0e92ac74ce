//! Streaming PDF download with atomic placement.
//!
//! The body is streamed into a hidden temp file next to the target and only
//! renamed to `<output_dir>/<token>.pdf` once every byte has arrived. A failed
//! or truncated download leaves any earlier copy of the file untouched.

use std::io::Write;
use std::path::{Path, PathBuf};
use futures_util::StreamExt;
use patentfetch_common::AllowlistClient;
use tracing::{debug, info, instrument, warn};

use crate::error::RetrievalError;

pub struct PdfDownloader {
    client: AllowlistClient,
    chunk_size: usize,
}

impl PdfDownloader {
    pub fn new(client: AllowlistClient, chunk_size: usize) -> Self {
        Self { client, chunk_size: chunk_size.max(1) }
    }

    /// Canonical location of the PDF for `token`.
    pub fn output_path(output_dir: &Path, token: &str) -> PathBuf {
        output_dir.join(format!("{token}.pdf"))
    }

    /// Download `pdf_url` to `<output_dir>/<token>.pdf`, replacing any
    /// existing file. Returns the final path.
    #[instrument(skip(self, output_dir))]
    pub async fn download(
        &self,
        pdf_url: &str,
        token: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, RetrievalError> {
        let target = Self::output_path(output_dir, token);
        let fail = |message: String| RetrievalError::io(pdf_url, &target, message);

        let resp = self.client
            .get(pdf_url)
            .map_err(|e| fail(e.to_string()))?
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !resp.status().is_success() {
            warn!("PDF request returned status {} for {}", resp.status(), token);
            return Err(fail(format!("HTTP {}", resp.status())));
        }

        let expected = resp.content_length();
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{token}."))
            .suffix(".part")
            .tempfile_in(output_dir)
            .map_err(|e| fail(format!("cannot create temp file: {e}")))?;

        let mut written: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| fail(format!("stream interrupted: {e}")))?;
            for piece in chunk.chunks(self.chunk_size) {
                tmp.write_all(piece).map_err(|e| fail(e.to_string()))?;
                written += piece.len() as u64;
            }
        }

        tmp.flush().map_err(|e| fail(e.to_string()))?;

        if let Some(expected) = expected {
            if expected != written {
                return Err(fail(format!("received {written} of {expected} bytes")));
            }
        }

        let dest = target.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            tmp.as_file().sync_all()?;
            tmp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| fail(format!("write task failed: {e}")))?
        .map_err(|e| fail(e.to_string()))?;
        debug!(bytes = written, expected = ?expected, "PDF stream complete");
        info!("Saved {} ({} bytes)", target.display(), written);

        Ok(target)
    }
}
