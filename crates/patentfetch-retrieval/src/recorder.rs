//! Failure recording.
//!
//! The pipeline hands every failed identifier to a [`FailureRecorder`].
//! Recorders must never fail the batch: write errors are logged and dropped.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::models::FailureRecord;

/// Identity of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total: usize,
}

impl SessionInfo {
    pub fn start(total: usize) -> Self {
        Self { id: Uuid::new_v4(), started_at: Utc::now(), total }
    }
}

/// Sink for failed identifiers. Append-only; implementations swallow their
/// own errors.
pub trait FailureRecorder: Send + Sync {
    /// Called once per batch before any item is processed.
    fn begin_session(&self, session: &SessionInfo);

    fn record(&self, record: &FailureRecord);
}

/// Appends one text line per failure to a log file, with a delimiter line at
/// the start of every session.
pub struct FileFailureRecorder {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileFailureRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, line: &str) {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{line}"));

        if let Err(e) = result {
            tracing::warn!("Could not append to failure log {}: {}", self.path.display(), e);
        }
    }
}

/// `==== Session <id> started <ts> (<n> identifiers) ====`
pub fn session_delimiter(session: &SessionInfo) -> String {
    format!(
        "==== Session {} started {} ({} identifiers) ====",
        session.id,
        session.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        session.total,
    )
}

/// One failure, pipe-separated. Pipes and newlines inside values are
/// flattened so every record stays on one line.
pub fn failure_line(at: DateTime<Utc>, record: &FailureRecord) -> String {
    format!(
        "{} | original={} | normalized={} | kind={} | reason={} | url={}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        flatten(&record.original),
        flatten(&record.normalized),
        record.kind.as_str(),
        flatten(&record.reason),
        flatten(&record.url),
    )
}

fn flatten(value: &str) -> String {
    value.replace(['\r', '\n'], " ").replace('|', "/")
}

impl FailureRecorder for FileFailureRecorder {
    fn begin_session(&self, session: &SessionInfo) {
        self.append_line(&session_delimiter(session));
    }

    fn record(&self, record: &FailureRecord) {
        self.append_line(&failure_line(Utc::now(), record));
    }
}

/// Keeps everything in memory. Used by tests and by callers that only want
/// the [`crate::BatchSummary`].
#[derive(Default)]
pub struct MemoryFailureRecorder {
    sessions: Mutex<Vec<SessionInfo>>,
    records: Mutex<Vec<FailureRecord>>,
}

impl MemoryFailureRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl FailureRecorder for MemoryFailureRecorder {
    fn begin_session(&self, session: &SessionInfo) {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner()).push(session.clone());
    }

    fn record(&self, record: &FailureRecord) {
        self.records.lock().unwrap_or_else(|p| p.into_inner()).push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;

    fn record(original: &str, reason: &str) -> FailureRecord {
        FailureRecord {
            original: original.to_string(),
            normalized: crate::normalise::normalize(original),
            kind: FailureKind::NotFound,
            reason: reason.to_string(),
            url: format!("https://patents.google.com/patent/{}", crate::normalise::normalize(original)),
        }
    }

    #[test]
    fn test_file_recorder_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.log");
        let rec = FileFailureRecorder::new(&path);

        rec.begin_session(&SessionInfo::start(2));
        rec.record(&record("US 1", "HTTP 404"));
        rec.begin_session(&SessionInfo::start(1));
        rec.record(&record("US 2", "no PDF link on detail page"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("==== Session "));
        assert!(lines[0].ends_with("(2 identifiers) ===="));
        assert!(lines[1].contains("original=US 1 | normalized=US1 | kind=not_found | reason=HTTP 404"));
        assert!(lines[1].ends_with("url=https://patents.google.com/patent/US1"));
        assert!(lines[2].starts_with("==== Session "));
        assert!(lines[3].contains("original=US 2"));
    }

    #[test]
    fn test_failure_line_flattens_separators() {
        let line = failure_line(Utc::now(), &record("US|1", "line one\nline two"));
        assert!(!line.contains('\n'));
        assert!(line.contains("original=US/1"));
        assert!(line.contains("reason=line one line two"));
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append.
        let rec = FileFailureRecorder::new(dir.path());
        rec.begin_session(&SessionInfo::start(1));
        rec.record(&record("US1", "boom"));
    }

    #[test]
    fn test_memory_recorder_keeps_order() {
        let rec = MemoryFailureRecorder::new();
        rec.begin_session(&SessionInfo::start(2));
        rec.record(&record("A1", "x"));
        rec.record(&record("B2", "y"));
        assert_eq!(rec.sessions().len(), 1);
        let names: Vec<String> = rec.records().into_iter().map(|r| r.original).collect();
        assert_eq!(names, vec!["A1", "B2"]);
    }
}
