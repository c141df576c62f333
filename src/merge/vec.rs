use super::shutdown::Shutdown;
use super::window::Window;
use super::{MergeOptions, Mode, PendingSet};
use crate::source::{Settlement, Source};
use crate::utils::WakerVec;

use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};
use fixedbitset::FixedBitSet;
use futures_core::stream::{FusedStream, Stream};
use pin_project::{pin_project, pinned_drop};

enum State<E> {
    Running,
    Draining(Shutdown<E>),
    Terminal,
}

/// A source that merges multiple sources into a single source.
///
/// At most `concurrency` sources are read from at the same time; the others
/// wait in a backlog and are admitted, in order, as active sources complete.
/// Every active source has at most one outstanding read, and a source is only
/// read from again after its previous value was handed to the consumer.
///
/// When the merge stops before every source completed, because a source
/// failed or because the merge was closed, the sources which are still active
/// are closed according to the configured [`Mode`].
///
/// This `struct` is created by [`merge`][crate::merge()] and the methods on
/// the [`Merge`][crate::Merge] trait. See their documentation for more.
#[pin_project(PinnedDrop)]
pub struct Merge<S>
where
    S: Source,
{
    pending: PendingSet<S>,
    window: Window<S>,
    wakers: WakerVec,
    in_flight: FixedBitSet,
    cursor: usize,
    mode: Mode,
    state: State<S::Error>,
}

impl<S> Merge<S>
where
    S: Source,
{
    pub(crate) fn new(sources: Vec<S>, options: MergeOptions) -> Self {
        let (window, active) = Window::new(sources, options.get_concurrency());
        let capacity = window.capacity();
        let mut pending = PendingSet::with_capacity(capacity);
        for source in active {
            pending.insert(Box::pin(source));
        }
        Self {
            pending,
            window,
            wakers: WakerVec::new(capacity),
            in_flight: FixedBitSet::with_capacity(capacity),
            cursor: 0,
            mode: options.get_mode(),
            state: State::Running,
        }
    }

    /// The number of sources currently being read from.
    pub fn active_len(&self) -> usize {
        self.pending.len()
    }

    /// The number of sources waiting for a free slot.
    pub fn queued_len(&self) -> usize {
        self.window.queued_len()
    }

    /// The closing policy of this merge.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns `true` once the merge has finished, and will not read from
    /// any of its sources anymore.
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, State::Terminal)
    }
}

impl<S> fmt::Debug for Merge<S>
where
    S: Source,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Running => "running",
            State::Draining(_) => "draining",
            State::Terminal => "terminal",
        };
        f.debug_struct("Merge")
            .field("mode", &self.mode)
            .field("active", &self.pending.len())
            .field("queued", &self.window.queued_len())
            .field("state", &state)
            .finish()
    }
}

impl<S> Source for Merge<S>
where
    S: Source,
{
    type Item = S::Item;
    type Error = S::Error;

    fn poll_advance(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        let this = self.project();

        let mut readiness = this.wakers.readiness().lock().unwrap();
        readiness.set_waker(cx.waker());

        loop {
            match this.state {
                State::Running => {}
                State::Draining(shutdown) => {
                    drop(readiness);
                    let outcome =
                        match shutdown.poll_shutdown(this.pending, this.in_flight, this.wakers) {
                            Poll::Ready(outcome) => outcome,
                            Poll::Pending => return Poll::Pending,
                        };
                    *this.state = State::Terminal;
                    return Poll::Ready(match outcome {
                        Some(err) => Settlement::Failed(err),
                        None => Settlement::Completed,
                    });
                }
                State::Terminal => return Poll::Ready(Settlement::Completed),
            }

            if this.pending.is_empty() {
                tracing::trace!("all sources completed");
                *this.state = State::Terminal;
                return Poll::Ready(Settlement::Completed);
            }

            // Find the next slot which was woken since we last polled it,
            // starting right after the slot which last produced a value.
            let Some(index) = readiness.next_ready(*this.cursor) else {
                return Poll::Pending;
            };
            readiness.clear_ready(index);

            // unlock readiness so we don't deadlock when polling
            drop(readiness);

            let Some(source) = this.pending.get_mut(index) else {
                // A slot which has been vacated and not refilled.
                readiness = this.wakers.readiness().lock().unwrap();
                continue;
            };

            let mut cx = Context::from_waker(this.wakers.get(index));
            match source.as_mut().poll_advance(&mut cx) {
                Poll::Ready(Settlement::Value(value)) => {
                    this.in_flight.set(index, false);
                    // The next read is only issued once the consumer asks for
                    // another value.
                    this.wakers.readiness().lock().unwrap().set_ready(index);
                    *this.cursor = index + 1;
                    return Poll::Ready(Settlement::Value(value));
                }
                Poll::Ready(Settlement::Completed) => {
                    this.in_flight.set(index, false);
                    this.pending.remove(index);
                    tracing::trace!(slot = index, "source completed");

                    if let Some(next) = this.window.admit_next() {
                        let slot = this.pending.insert(Box::pin(next));
                        tracing::trace!(slot, queued = this.window.queued_len(), "source admitted");
                        this.wakers.readiness().lock().unwrap().set_ready(slot);
                    }
                }
                Poll::Ready(Settlement::Failed(err)) => {
                    this.in_flight.set(index, false);
                    this.pending.remove(index);
                    tracing::trace!(slot = index, "source failed");

                    this.window.clear();
                    *this.state =
                        State::Draining(Shutdown::new(*this.mode, Some(err), this.pending));
                }
                Poll::Pending => {
                    this.in_flight.set(index, true);
                }
            }

            readiness = this.wakers.readiness().lock().unwrap();
        }
    }

    /// Stop the merge early, closing the sources which are still active
    /// according to the configured [`Mode`].
    ///
    /// Under [`Mode::CloseAndWait`] this resolves once every source finished
    /// closing, with the first failure raised while doing so. Closing a merge
    /// which already finished does nothing.
    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let this = self.project();

        if let State::Running = this.state {
            this.window.clear();
            *this.state = State::Draining(Shutdown::new(*this.mode, None, this.pending));
        }

        match this.state {
            State::Draining(shutdown) => {
                this.wakers.readiness().lock().unwrap().set_waker(cx.waker());
                let outcome =
                    match shutdown.poll_shutdown(this.pending, this.in_flight, this.wakers) {
                        Poll::Ready(outcome) => outcome,
                        Poll::Pending => return Poll::Pending,
                    };
                *this.state = State::Terminal;
                Poll::Ready(match outcome {
                    Some(err) => Err(err),
                    None => Ok(()),
                })
            }
            _ => Poll::Ready(Ok(())),
        }
    }
}

impl<S> Stream for Merge<S>
where
    S: Source,
{
    type Item = Result<S::Item, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_advance(cx).map(Settlement::into_option)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            State::Terminal => (0, Some(0)),
            _ => (0, None),
        }
    }
}

impl<S> FusedStream for Merge<S>
where
    S: Source,
{
    fn is_terminated(&self) -> bool {
        Merge::is_terminated(self)
    }
}

#[pinned_drop]
impl<S> PinnedDrop for Merge<S>
where
    S: Source,
{
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        let state = core::mem::replace(this.state, State::Terminal);
        let shutdown = match state {
            State::Running => Shutdown::new(*this.mode, None, this.pending),
            State::Draining(shutdown) => shutdown,
            State::Terminal => return,
        };
        shutdown.abandon(this.pending);
    }
}
