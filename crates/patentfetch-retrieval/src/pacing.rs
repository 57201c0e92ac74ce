//! Inter-item pacing.
//!
//! The patents site has informal rate limits, so the pipeline waits a fixed
//! delay between identifiers. The wait goes through [`Pacer`] so tests can
//! count pauses without sleeping.

use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Records requested pauses and returns immediately.
#[derive(Default)]
pub struct CountingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl CountingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.pauses.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self, delay: Duration) {
        self.pauses.lock().unwrap_or_else(|p| p.into_inner()).push(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pacer_waits_full_delay() {
        let start = tokio::time::Instant::now();
        TokioPacer.pause(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_counting_pacer_records() {
        let pacer = CountingPacer::new();
        pacer.pause(Duration::from_millis(5)).await;
        pacer.pause(Duration::from_millis(7)).await;
        assert_eq!(pacer.count(), 2);
        assert_eq!(pacer.pauses(), vec![Duration::from_millis(5), Duration::from_millis(7)]);
    }
}
