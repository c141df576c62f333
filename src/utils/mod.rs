//! Utilities to implement the merge combinator of this crate.

mod wakers;

pub(crate) use wakers::{noop_waker, WakerVec};

#[cfg(test)]
pub(crate) mod channel;
