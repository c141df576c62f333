use core::task::Waker;
use fixedbitset::FixedBitSet;

/// Tracks which slots are "ready" and should be polled.
#[derive(Debug)]
pub(crate) struct ReadinessVec {
    ready_count: usize,
    readiness_list: FixedBitSet,
    parent_waker: Option<Waker>,
}

impl ReadinessVec {
    /// Create a new instance of readiness with every slot marked ready.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            ready_count: len,
            // See https://github.com/petgraph/fixedbitset/issues/101
            readiness_list: FixedBitSet::with_capacity_and_blocks(len, std::iter::repeat(!0)),
            parent_waker: None,
        }
    }

    /// Set the ready state to `true` for the given index
    ///
    /// Returns the old ready state for this id
    pub(crate) fn set_ready(&mut self, index: usize) -> bool {
        if !self.readiness_list[index] {
            self.ready_count += 1;
            self.readiness_list.set(index, true);
            false
        } else {
            true
        }
    }

    /// Set the ready state to `false` for the given index
    ///
    /// Returns whether the task id was previously ready
    pub(crate) fn clear_ready(&mut self, index: usize) -> bool {
        if self.readiness_list[index] {
            self.ready_count -= 1;
            self.readiness_list.set(index, false);
            true
        } else {
            false
        }
    }

    /// Returns `true` if any of the wakers are ready.
    #[cfg(test)]
    pub(crate) fn any_ready(&self) -> bool {
        self.ready_count > 0
    }

    /// Find the first ready slot, scanning forward from `start` and wrapping
    /// around.
    pub(crate) fn next_ready(&self, start: usize) -> Option<usize> {
        let len = self.readiness_list.len();
        if self.ready_count == 0 || len == 0 {
            return None;
        }
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|index| self.readiness_list[*index])
    }

    /// Access the parent waker.
    #[inline]
    pub(crate) fn parent_waker(&self) -> Option<&Waker> {
        self.parent_waker.as_ref()
    }

    /// Set the parent `Waker`. This needs to be called at the start of every
    /// `poll` function.
    pub(crate) fn set_waker(&mut self, parent_waker: &Waker) {
        match &mut self.parent_waker {
            Some(prev) => prev.clone_from(parent_waker),
            None => self.parent_waker = Some(parent_waker.clone()),
        }
    }
}
