use super::{Settlement, Source};

use core::pin::Pin;
use core::task::{Context, Poll};
use futures_core::Stream;
use pin_project::pin_project;

/// A `Stream` of `Result`s backed by a [`Source`].
///
/// The stream ends after the first `Err`. This `struct` is created by the
/// [`into_stream`] method on [`SourceExt`]. See its documentation for more.
///
/// [`into_stream`]: crate::source::SourceExt::into_stream
/// [`SourceExt`]: crate::source::SourceExt
#[derive(Debug)]
#[pin_project]
pub struct IntoStream<S> {
    #[pin]
    source: S,
    done: bool,
}

impl<S> IntoStream<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            done: false,
        }
    }

    /// Acquires a pinned mutable reference to the underlying source.
    pub fn get_pin_mut(self: Pin<&mut Self>) -> Pin<&mut S> {
        self.project().source
    }

    /// Consumes this adapter, returning the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Source> Stream for IntoStream<S> {
    type Item = Result<S::Item, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        let settlement = match this.source.poll_advance(cx) {
            Poll::Ready(settlement) => settlement,
            Poll::Pending => return Poll::Pending,
        };
        if !matches!(settlement, Settlement::Value(_)) {
            *this.done = true;
        }
        Poll::Ready(settlement.into_option())
    }
}
