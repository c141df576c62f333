use core::num::NonZeroUsize;
use std::collections::VecDeque;

/// Splits the sources of a merge into the ones read from right away and a
/// FIFO backlog of sources admitted as slots free up.
#[derive(Debug)]
pub(crate) struct Window<S> {
    capacity: usize,
    backlog: VecDeque<S>,
}

impl<S> Window<S> {
    /// Returns the window together with the sources which start out active,
    /// both in input order.
    pub(crate) fn new(mut sources: Vec<S>, limit: Option<NonZeroUsize>) -> (Self, Vec<S>) {
        let capacity = match limit {
            Some(limit) => limit.get().min(sources.len()),
            None => sources.len(),
        };
        let backlog = sources.split_off(capacity).into();
        (Self { capacity, backlog }, sources)
    }

    /// The maximum number of sources active at the same time.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take the next queued source, if any.
    pub(crate) fn admit_next(&mut self) -> Option<S> {
        self.backlog.pop_front()
    }

    pub(crate) fn queued_len(&self) -> usize {
        self.backlog.len()
    }

    /// Drop every source which never got admitted.
    pub(crate) fn clear(&mut self) {
        self.backlog.clear();
    }
}
