use std::sync::Arc;
use std::task::{Wake, Waker};

/// A waker which discards its wake-ups.
struct NoopWaker;

impl Wake for NoopWaker {
    fn wake(self: Arc<Self>) {}
}

/// Used to issue fire-and-forget calls nobody will await.
pub(crate) fn noop_waker() -> Waker {
    Arc::new(NoopWaker).into()
}
