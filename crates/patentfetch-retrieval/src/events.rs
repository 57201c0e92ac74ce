//! Progress events emitted by the pipeline.
//!
//! The pipeline reports through a [`RetrievalObserver`]: progress counters,
//! human-readable log lines and a status line with a kind. Calls are made
//! synchronously from the worker, so implementations must be quick.

use std::sync::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Downloading,
    Success,
    Error,
    Complete,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Info        => "info",
            StatusKind::Downloading => "downloading",
            StatusKind::Success     => "success",
            StatusKind::Error       => "error",
            StatusKind::Complete    => "complete",
        }
    }
}

/// Presentation-layer callbacks. Every method has a no-op default.
pub trait RetrievalObserver: Send + Sync {
    /// `current` items of `total` have reached a terminal state.
    fn on_progress(&self, _current: usize, _total: usize) {}

    fn on_log_line(&self, _line: &str) {}

    fn on_status(&self, _text: &str, _kind: StatusKind) {}
}

/// Discards everything.
pub struct NullObserver;

impl RetrievalObserver for NullObserver {}

/// One observer callback, as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetrievalEvent {
    Progress { current: usize, total: usize },
    LogLine { line: String },
    Status { text: String, kind: StatusKind },
}

/// Records every callback in order.
#[derive(Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<RetrievalEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RetrievalEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RetrievalEvent::LogLine { line } => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RetrievalEvent::Progress { current, total } => Some((current, total)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: RetrievalEvent) {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).push(event);
    }
}

impl RetrievalObserver for MemoryObserver {
    fn on_progress(&self, current: usize, total: usize) {
        self.push(RetrievalEvent::Progress { current, total });
    }

    fn on_log_line(&self, line: &str) {
        self.push(RetrievalEvent::LogLine { line: line.to_string() });
    }

    fn on_status(&self, text: &str, kind: StatusKind) {
        self.push(RetrievalEvent::Status { text: text.to_string(), kind });
    }
}

/// Publishes events on a broadcast channel for consumers that prefer a
/// stream (SSE handlers, UI event loops).
#[derive(Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<RetrievalEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RetrievalEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: RetrievalEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

impl RetrievalObserver for BroadcastObserver {
    fn on_progress(&self, current: usize, total: usize) {
        self.send(RetrievalEvent::Progress { current, total });
    }

    fn on_log_line(&self, line: &str) {
        self.send(RetrievalEvent::LogLine { line: line.to_string() });
    }

    fn on_status(&self, text: &str, kind: StatusKind) {
        self.send(RetrievalEvent::Status { text: text.to_string(), kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_observer_filters() {
        let obs = MemoryObserver::new();
        obs.on_status("Downloading 1/2: US1", StatusKind::Downloading);
        obs.on_log_line("[1/2] Downloading: US1");
        obs.on_progress(1, 2);
        assert_eq!(obs.events().len(), 3);
        assert_eq!(obs.log_lines(), vec!["[1/2] Downloading: US1"]);
        assert_eq!(obs.progress(), vec![(1, 2)]);
    }

    #[tokio::test]
    async fn test_broadcast_observer_delivers_in_order() {
        let obs = BroadcastObserver::new(16);
        let mut rx = obs.subscribe();
        obs.on_progress(1, 3);
        obs.on_status("done", StatusKind::Complete);

        assert_eq!(rx.recv().await.unwrap(), RetrievalEvent::Progress { current: 1, total: 3 });
        assert_eq!(
            rx.recv().await.unwrap(),
            RetrievalEvent::Status { text: "done".into(), kind: StatusKind::Complete }
        );
    }

    #[test]
    fn test_event_serialises_with_type_tag() {
        let json = serde_json::to_value(RetrievalEvent::Status {
            text: "ok".into(),
            kind: StatusKind::Success,
        })
        .unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["kind"], "success");
    }
}
