//! Sequential retrieval pipeline.
//!
//! Orchestrates one batch (a session):
//!   1. Create the output directory (fatal on failure, before any request)
//!   2. Open a failure-log session
//!   3. For each identifier, strictly one at a time:
//!      normalise → resolve PDF URL → download → record outcome
//!   4. Pause between items; honour cancellation at item boundaries
//!   5. Report the summary through the observer
//!
//! Per-item failures never abort the batch. Each identifier gets exactly one
//! attempt and exactly one [`RetrievalResult`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use patentfetch_config::Config;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::download::PdfDownloader;
use crate::error::{BatchError, RetrievalError};
use crate::events::{NullObserver, RetrievalObserver, StatusKind};
use crate::models::{BatchSummary, PatentIdentifier, RetrievalResult};
use crate::pacing::{Pacer, TokioPacer};
use crate::recorder::{FailureRecorder, FileFailureRecorder, MemoryFailureRecorder, SessionInfo};
use crate::sources::google_patents::GooglePatentsClient;
use crate::sources::PatentSource;

/// Cooperative stop request shared between the caller and a running batch.
/// Checked before each item; an in-flight request is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RetrievalPipeline {
    source: Arc<dyn PatentSource>,
    downloader: PdfDownloader,
    recorder: Arc<dyn FailureRecorder>,
    observer: Arc<dyn RetrievalObserver>,
    pacer: Arc<dyn Pacer>,
    output_dir: PathBuf,
    inter_item_delay: Duration,
}

impl RetrievalPipeline {
    /// Pipeline with an in-memory failure recorder, no observer, a real
    /// timer and a 2 s inter-item delay.
    pub fn new(source: Arc<dyn PatentSource>, downloader: PdfDownloader, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            downloader,
            recorder: Arc::new(MemoryFailureRecorder::new()),
            observer: Arc::new(NullObserver),
            pacer: Arc::new(TokioPacer),
            output_dir: output_dir.into(),
            inter_item_delay: Duration::from_secs(2),
        }
    }

    /// Google Patents source + downloader sharing one allowlisted client,
    /// failures appended to `output.failure_log`.
    pub fn from_config(cfg: &Config) -> Result<Self, BatchError> {
        let source = GooglePatentsClient::new(&cfg.retrieval)?;
        let downloader = PdfDownloader::new(source.http().clone(), cfg.retrieval.chunk_size);

        Ok(Self::new(Arc::new(source), downloader, cfg.output.dir.clone())
            .with_recorder(Arc::new(FileFailureRecorder::new(cfg.output.failure_log.clone())))
            .with_inter_item_delay(cfg.retrieval.inter_item_delay()))
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn FailureRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RetrievalObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the batch on a background task. The caller keeps the
    /// [`CancelFlag`] clone to stop it.
    pub fn spawn(self: Arc<Self>, raw_ids: Vec<String>, cancel: CancelFlag) -> JoinHandle<Result<BatchSummary, BatchError>> {
        tokio::spawn(async move { self.run(&raw_ids, &cancel).await })
    }

    /// Process every identifier in order and return the session summary.
    ///
    /// Only setup problems (output directory) are returned as errors; item
    /// failures are folded into the summary.
    #[instrument(skip_all, fields(total = raw_ids.len()))]
    pub async fn run(&self, raw_ids: &[String], cancel: &CancelFlag) -> Result<BatchSummary, BatchError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| BatchError::OutputDir { path: self.output_dir.clone(), source })?;

        let total = raw_ids.len();
        let session = SessionInfo::start(total);
        self.recorder.begin_session(&session);
        info!(session = %session.id, "Starting retrieval batch of {} identifiers", total);
        self.observer.on_status(&format!("Starting download of {total} patents"), StatusKind::Info);

        let mut summary = BatchSummary::new(total);
        let mut items = raw_ids.iter().map(|raw| PatentIdentifier::new(raw)).enumerate();

        while let Some((i, id)) = items.next() {
            if i > 0 && !cancel.is_cancelled() {
                self.pacer.pause(self.inter_item_delay).await;
            }
            if cancel.is_cancelled() {
                info!(remaining = total - i, "Batch cancelled");
                self.observer.on_log_line("Download stopped by user");
                summary.cancelled = true;
                summary.push(id, RetrievalResult::NotAttempted);
                for (_, rest) in items.by_ref() {
                    summary.push(rest, RetrievalResult::NotAttempted);
                }
                break;
            }

            let position = i + 1;
            self.observer.on_status(
                &format!("Downloading {position}/{total}: {}", id.original()),
                StatusKind::Downloading,
            );
            self.observer.on_log_line(&format!("[{position}/{total}] Downloading: {}", id.original()));

            let result = self.process(&id).await;
            let failed = result.is_failure();
            summary.push(id, result);
            if failed {
                if let Some(record) = summary.failures.last() {
                    self.recorder.record(record);
                }
            }

            self.observer.on_progress(position, total);
        }

        for line in summary.report_lines() {
            self.observer.on_log_line(&line);
        }
        if summary.cancelled {
            self.observer.on_status(
                &format!("Stopped. {}/{} successful", summary.successful, total),
                StatusKind::Info,
            );
        } else {
            self.observer.on_status(
                &format!("Complete! {}/{} successful", summary.successful, total),
                StatusKind::Complete,
            );
        }

        info!(
            session = %session.id,
            successful = summary.successful,
            failed = summary.failed,
            not_attempted = summary.not_attempted,
            "Retrieval batch finished"
        );
        Ok(summary)
    }

    /// Pending → Fetching → Saved | Failed for a single identifier.
    async fn process(&self, id: &PatentIdentifier) -> RetrievalResult {
        match self.retrieve(id).await {
            Ok(saved_path) => {
                self.observer.on_log_line(&format!("  SUCCESS: {}", saved_path.display()));
                self.observer.on_status(&format!("Saved {}", id.token()), StatusKind::Success);
                RetrievalResult::Success { saved_path }
            }
            Err(e) => {
                let Some(kind) = e.kind() else {
                    info!(token = %id.token(), "Retrieval cancelled");
                    return RetrievalResult::NotAttempted;
                };
                warn!(token = %id.token(), error = %e, "Retrieval failed");
                self.observer.on_log_line(&format!("  FAILED: {e}"));
                self.observer.on_status(&format!("Failed {}", id.original()), StatusKind::Error);
                RetrievalResult::Failure {
                    kind,
                    reason: e.to_string(),
                    attempted_url: e.attempted_url().map(String::from),
                }
            }
        }
    }

    async fn retrieve(&self, id: &PatentIdentifier) -> Result<PathBuf, RetrievalError> {
        if !id.is_valid() {
            return Err(RetrievalError::InvalidIdentifier { original: id.original().to_string() });
        }
        let pdf_url = self.source.resolve_pdf_url(id.token()).await?;
        self.downloader.download(&pdf_url, id.token(), &self.output_dir).await
    }
}
