#![allow(dead_code)]

use futures_fanin::source::{Settlement, Source};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::time::{sleep, Duration, Sleep};

/// What every ticker sharing a probe did.
#[derive(Debug, Default)]
pub struct Stats {
    pub outstanding: usize,
    pub max_outstanding: usize,
    pub advances: Vec<&'static str>,
    pub close_started: Vec<&'static str>,
    pub close_finished: Vec<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct Probe(Arc<Mutex<Stats>>);

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> std::sync::MutexGuard<'_, Stats> {
        self.0.lock().unwrap()
    }

    pub fn ticker(&self, name: &'static str, period_ms: u64) -> Ticker {
        Ticker {
            name,
            period: Duration::from_millis(period_ms),
            count: 0,
            limit: None,
            fail_at: None,
            delay: None,
            cleanup: None,
            reading: false,
            closed: false,
            probe: self.clone(),
        }
    }
}

/// Yields `"{name}: {i}"` right away, then once every `period`. Closing it
/// takes 100ms of cleanup.
#[derive(Debug)]
pub struct Ticker {
    name: &'static str,
    period: Duration,
    count: usize,
    limit: Option<usize>,
    fail_at: Option<usize>,
    delay: Option<Pin<Box<Sleep>>>,
    cleanup: Option<Pin<Box<Sleep>>>,
    reading: bool,
    closed: bool,
    probe: Probe,
}

impl Ticker {
    /// Complete after `limit` values.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fail on the given read, counting from one.
    pub fn fail_at(mut self, read: usize) -> Self {
        self.fail_at = Some(read);
        self
    }

    fn finish_read(&mut self) {
        if self.reading {
            self.reading = false;
            self.probe.stats().outstanding -= 1;
        }
    }
}

impl Source for Ticker {
    type Item = String;
    type Error = String;

    fn poll_advance(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        if self.closed {
            self.finish_read();
            return Poll::Ready(Settlement::Completed);
        }
        if !self.reading {
            self.reading = true;
            let mut stats = self.probe.stats();
            stats.advances.push(self.name);
            stats.outstanding += 1;
            stats.max_outstanding = stats.max_outstanding.max(stats.outstanding);
        }

        if self.count > 0 {
            let period = self.period;
            let delay = self.delay.get_or_insert_with(|| Box::pin(sleep(period)));
            if delay.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
            self.delay = None;
        }

        self.finish_read();
        let read = self.count + 1;
        if self.fail_at == Some(read) {
            return Poll::Ready(Settlement::Failed(format!("{} failed", self.name)));
        }
        if self.limit.is_some_and(|limit| self.count >= limit) {
            return Poll::Ready(Settlement::Completed);
        }
        self.count = read;
        Poll::Ready(Settlement::Value(format!("{}: {}", self.name, read - 1)))
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.closed {
            return Poll::Ready(Ok(()));
        }
        if self.cleanup.is_none() {
            self.probe.stats().close_started.push(self.name);
            self.cleanup = Some(Box::pin(sleep(Duration::from_millis(100))));
        }
        let cleanup = self.cleanup.as_mut().map(|sleep| sleep.as_mut().poll(cx));
        match cleanup {
            Some(Poll::Pending) => Poll::Pending,
            _ => {
                self.cleanup = None;
                self.closed = true;
                self.probe.stats().close_finished.push(self.name);
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.finish_read();
    }
}
