//! Data models for the retrieval pipeline.

use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::normalise::normalize;

/// One input identifier, as read and as normalised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatentIdentifier {
    original: String,
    token: String,
}

impl PatentIdentifier {
    pub fn new(raw: &str) -> Self {
        Self { original: raw.to_string(), token: normalize(raw) }
    }

    pub fn original(&self) -> &str { &self.original }

    pub fn token(&self) -> &str { &self.token }

    /// False when normalisation left nothing to fetch.
    pub fn is_valid(&self) -> bool { !self.token.is_empty() }
}

impl fmt::Display for PatentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Coarse failure category used for counting and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidIdentifier,
    NotFound,
    Io,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidIdentifier => "invalid_identifier",
            FailureKind::NotFound          => "not_found",
            FailureKind::Io                => "io",
        }
    }
}

/// Outcome of processing one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalResult {
    Success { saved_path: PathBuf },
    Failure { kind: FailureKind, reason: String, attempted_url: Option<String> },
    /// The batch was cancelled before this identifier was reached.
    NotAttempted,
}

impl RetrievalResult {
    pub fn is_success(&self) -> bool { matches!(self, RetrievalResult::Success { .. }) }

    pub fn is_failure(&self) -> bool { matches!(self, RetrievalResult::Failure { .. }) }
}

/// Lifecycle of a single identifier inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Fetching,
    Saved,
    Failed,
}

/// What the failure recorder persists for each failed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub original: String,
    pub normalized: String,
    pub kind: FailureKind,
    pub reason: String,
    /// Empty when no request was made (invalid identifier).
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub identifier: PatentIdentifier,
    pub result: RetrievalResult,
}

/// Aggregate counters for one session, plus the per-item trail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub not_attempted: usize,
    pub cancelled: bool,
    pub failures: Vec<FailureRecord>,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self { total, ..Default::default() }
    }

    /// Items that reached a terminal state (saved or failed).
    pub fn processed(&self) -> usize {
        self.successful + self.failed
    }

    pub(crate) fn push(&mut self, identifier: PatentIdentifier, result: RetrievalResult) {
        match &result {
            RetrievalResult::Success { .. } => self.successful += 1,
            RetrievalResult::Failure { kind, reason, attempted_url } => {
                self.failed += 1;
                self.failures.push(FailureRecord {
                    original: identifier.original().to_string(),
                    normalized: identifier.token().to_string(),
                    kind: *kind,
                    reason: reason.clone(),
                    url: attempted_url.clone().unwrap_or_default(),
                });
            }
            RetrievalResult::NotAttempted => self.not_attempted += 1,
        }
        self.outcomes.push(ItemOutcome { identifier, result });
    }

    /// Framed report lines, in the order they are shown to the user.
    pub fn report_lines(&self) -> Vec<String> {
        let rule = "=".repeat(50);
        let mut lines = vec![
            rule.clone(),
            if self.cancelled { "DOWNLOAD STOPPED".to_string() } else { "DOWNLOAD COMPLETE!".to_string() },
            rule.clone(),
            format!("Total patents:  {}", self.total),
            format!("Successful:     {}", self.successful),
            format!("Failed:         {}", self.failed),
        ];
        if self.not_attempted > 0 {
            lines.push(format!("Not attempted:  {}", self.not_attempted));
        }
        lines.push(rule);
        lines
    }
}
