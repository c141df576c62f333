use super::{Settlement, Source};

use core::convert::Infallible;
use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures_core::Stream;

/// Convert an infallible stream into a [`Source`].
///
/// Closing the source drops the stream; any read after that reports
/// [`Settlement::Completed`].
///
/// # Examples
///
/// ```
/// use futures_fanin::prelude::*;
/// use futures_fanin::source::{self, Settlement};
/// use futures_lite::future::block_on;
/// use futures_lite::stream;
///
/// block_on(async {
///     let mut s = source::from_stream(stream::repeat(7));
///     assert_eq!(s.advance().await, Settlement::Value(7));
///     s.close().await.unwrap();
///     assert_eq!(s.advance().await, Settlement::Completed);
/// })
/// ```
pub fn from_stream<S: Stream>(stream: S) -> FromStream<S> {
    FromStream {
        stream: Some(Box::pin(stream)),
    }
}

/// Convert a stream of `Result`s into a [`Source`].
///
/// An `Err` item settles as [`Settlement::Failed`] and ends the source.
///
/// # Examples
///
/// ```
/// use futures_fanin::prelude::*;
/// use futures_fanin::source::{self, Settlement};
/// use futures_lite::future::block_on;
/// use futures_lite::stream;
///
/// block_on(async {
///     let items = vec![Ok(1), Err("boom"), Ok(2)];
///     let mut s = source::from_try_stream(stream::iter(items));
///     assert_eq!(s.advance().await, Settlement::Value(1));
///     assert_eq!(s.advance().await, Settlement::Failed("boom"));
///     assert_eq!(s.advance().await, Settlement::Completed);
/// })
/// ```
pub fn from_try_stream<S, T, E>(stream: S) -> FromTryStream<S>
where
    S: Stream<Item = Result<T, E>>,
{
    FromTryStream {
        stream: Some(Box::pin(stream)),
    }
}

/// A [`Source`] backed by a `Stream`.
///
/// This `struct` is created by [`from_stream`]. See its documentation for more.
pub struct FromStream<S> {
    stream: Option<Pin<Box<S>>>,
}

impl<S> fmt::Debug for FromStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromStream")
            .field("closed", &self.stream.is_none())
            .finish()
    }
}

impl<S: Stream> Source for FromStream<S> {
    type Item = S::Item;
    type Error = Infallible;

    fn poll_advance(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        let Some(stream) = self.stream.as_mut() else {
            return Poll::Ready(Settlement::Completed);
        };
        match stream.as_mut().poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Settlement::Value(item)),
            Poll::Ready(None) => {
                self.stream = None;
                Poll::Ready(Settlement::Completed)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_close(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.stream = None;
        Poll::Ready(Ok(()))
    }
}

/// A [`Source`] backed by a `Stream` of `Result`s.
///
/// This `struct` is created by [`from_try_stream`]. See its documentation for
/// more.
pub struct FromTryStream<S> {
    stream: Option<Pin<Box<S>>>,
}

impl<S> fmt::Debug for FromTryStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromTryStream")
            .field("closed", &self.stream.is_none())
            .finish()
    }
}

impl<S, T, E> Source for FromTryStream<S>
where
    S: Stream<Item = Result<T, E>>,
{
    type Item = T;
    type Error = E;

    fn poll_advance(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        let Some(stream) = self.stream.as_mut() else {
            return Poll::Ready(Settlement::Completed);
        };
        let settlement = match stream.as_mut().poll_next(cx) {
            Poll::Ready(item) => Settlement::from(item),
            Poll::Pending => return Poll::Pending,
        };
        if !settlement.is_value() {
            self.stream = None;
        }
        Poll::Ready(settlement)
    }

    fn poll_close(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.stream = None;
        Poll::Ready(Ok(()))
    }
}
