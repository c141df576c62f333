use super::{Mode, PendingSet};
use crate::source::{Settlement, Source};
use crate::utils::{noop_waker, WakerVec};

use core::task::{Context, Poll};
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting on `poll_close` of the remaining sources.
    Closing,
    /// Waiting on the reads which were still in flight when closing started.
    Draining,
}

/// Closes the sources which are still active once a merge stops.
///
/// Created exactly once per merge, either because a source failed (the
/// `trigger`) or because the consumer closed the merge early.
#[derive(Debug)]
pub(crate) struct Shutdown<E> {
    mode: Mode,
    phase: Phase,
    trigger: Option<E>,
    closing: FixedBitSet,
    failures: SmallVec<[E; 2]>,
}

impl<E> Shutdown<E> {
    pub(crate) fn new<S>(mode: Mode, trigger: Option<E>, pending: &PendingSet<S>) -> Self {
        let mut closing = FixedBitSet::with_capacity(pending.capacity());
        for (key, _) in pending.iter() {
            closing.grow(key + 1);
            closing.insert(key);
        }
        tracing::debug!(
            %mode,
            active = pending.len(),
            failed = trigger.is_some(),
            "merge shutting down"
        );
        Self {
            mode,
            phase: Phase::Closing,
            trigger,
            closing,
            failures: SmallVec::new(),
        }
    }

    /// Drive the shutdown. Resolves to the failure the consumer should see,
    /// if any. `pending` is empty once this returns `Ready`.
    ///
    /// Slot wakers forward to the parent waker, which the caller must have
    /// registered before calling this.
    pub(crate) fn poll_shutdown<S>(
        &mut self,
        pending: &mut PendingSet<S>,
        in_flight: &mut FixedBitSet,
        wakers: &WakerVec,
    ) -> Poll<Option<E>>
    where
        S: Source<Error = E>,
    {
        match self.mode {
            Mode::NoClose => {
                pending.clear();
                Poll::Ready(self.trigger.take())
            }
            Mode::CloseNoWait => {
                self.fire_close(pending);
                pending.clear();
                Poll::Ready(self.trigger.take())
            }
            Mode::CloseAndWait => {
                if self.phase == Phase::Closing {
                    if self.poll_close_all(pending, wakers).is_pending() {
                        return Poll::Pending;
                    }
                    self.phase = Phase::Draining;
                }
                if self.poll_drain_all(pending, in_flight, wakers).is_pending() {
                    return Poll::Pending;
                }
                pending.clear();
                Poll::Ready(self.outcome())
            }
        }
    }

    /// Give up on the shutdown because the merge is being dropped. Sources
    /// which were not closed yet get a single close request.
    pub(crate) fn abandon<S>(mut self, pending: &mut PendingSet<S>)
    where
        S: Source<Error = E>,
    {
        match self.mode {
            Mode::NoClose => {}
            Mode::CloseNoWait => self.fire_close(pending),
            Mode::CloseAndWait => {
                tracing::warn!(
                    active = pending.len(),
                    "merge dropped before its sources finished closing; close it before dropping to wait on them"
                );
                if self.phase == Phase::Closing {
                    self.fire_close(pending);
                }
            }
        }
        pending.clear();
    }

    /// Issue one close request to every source left to close, ignoring the
    /// outcome.
    fn fire_close<S>(&mut self, pending: &mut PendingSet<S>)
    where
        S: Source<Error = E>,
    {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        for key in self.closing.ones() {
            if let Some(source) = pending.get_mut(key) {
                let _ = source.as_mut().poll_close(&mut cx);
            }
        }
        self.closing.clear();
    }

    fn poll_close_all<S>(&mut self, pending: &mut PendingSet<S>, wakers: &WakerVec) -> Poll<()>
    where
        S: Source<Error = E>,
    {
        let keys: SmallVec<[usize; 8]> = self.closing.ones().collect();
        for key in keys {
            let Some(source) = pending.get_mut(key) else {
                self.closing.set(key, false);
                continue;
            };
            let mut cx = slot_context(wakers, key);
            if let Poll::Ready(res) = source.as_mut().poll_close(&mut cx) {
                self.closing.set(key, false);
                if let Err(err) = res {
                    self.failures.push(err);
                }
            }
        }
        if self.closing.is_clear() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    fn poll_drain_all<S>(
        &mut self,
        pending: &mut PendingSet<S>,
        in_flight: &mut FixedBitSet,
        wakers: &WakerVec,
    ) -> Poll<()>
    where
        S: Source<Error = E>,
    {
        let keys: SmallVec<[usize; 8]> = in_flight.ones().collect();
        for key in keys {
            let Some(source) = pending.get_mut(key) else {
                in_flight.set(key, false);
                continue;
            };
            let mut cx = slot_context(wakers, key);
            match source.as_mut().poll_advance(&mut cx) {
                Poll::Ready(Settlement::Failed(err)) => {
                    in_flight.set(key, false);
                    self.failures.push(err);
                }
                Poll::Ready(_) => in_flight.set(key, false),
                Poll::Pending => {}
            }
        }
        if in_flight.is_clear() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    /// The first failure seen while closing wins over the trigger.
    fn outcome(&mut self) -> Option<E> {
        let mut failures = self.failures.drain(..);
        match failures.next() {
            Some(first) => {
                let discarded = failures.count() + usize::from(self.trigger.take().is_some());
                if discarded > 0 {
                    tracing::debug!(discarded, "discarding failures superseded while closing");
                }
                Some(first)
            }
            None => self.trigger.take(),
        }
    }
}

/// The context to poll a slot with while shutting down.
///
/// A slot waker only reaches the parent task when it flips the slot from idle
/// to ready, so the slot has to be marked idle before it is polled again.
fn slot_context(wakers: &WakerVec, key: usize) -> Context<'_> {
    wakers.readiness().lock().unwrap().clear_ready(key);
    Context::from_waker(wakers.get(key))
}
