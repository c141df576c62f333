//! Asynchronous producers which can be merged.
//!
//! A [`Source`] is the unit of input to [`merge`][crate::merge()]. It looks a
//! lot like [`Stream`][futures_core::Stream], with two differences: every
//! read settles as a [`Settlement`] which can carry a failure, and a source can
//! be asked to shut down early through [`Source::poll_close`].
//!
//! # Examples
//!
//! ```
//! use futures_fanin::prelude::*;
//! use futures_fanin::source::{self, Settlement};
//! use futures_lite::future::block_on;
//! use futures_lite::stream;
//!
//! block_on(async {
//!     let mut s = source::from_stream(stream::iter(vec![1, 2]));
//!     assert_eq!(s.advance().await, Settlement::Value(1));
//!     assert_eq!(s.advance().await, Settlement::Value(2));
//!     assert_eq!(s.advance().await, Settlement::Completed);
//! })
//! ```

use core::ops::DerefMut;
use core::pin::Pin;
use core::task::{Context, Poll};

pub use from_stream::{from_stream, from_try_stream, FromStream, FromTryStream};
pub use into_stream::IntoStream;
pub use on_close::OnClose;
pub use source_ext::{Advance, Close, SourceExt};

mod from_stream;
mod into_stream;
mod on_close;
mod source_ext;

/// The outcome of asking a [`Source`] for its next element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Settlement<T, E> {
    /// The source produced a value.
    Value(T),
    /// The source has no more values.
    Completed,
    /// The source failed. It will not produce any more values.
    Failed(E),
}

impl<T, E> Settlement<T, E> {
    /// Returns `true` if this is a [`Settlement::Value`].
    pub fn is_value(&self) -> bool {
        matches!(self, Settlement::Value(_))
    }

    /// Convert into the `Option<Result<..>>` shape used by fallible streams.
    pub fn into_option(self) -> Option<Result<T, E>> {
        match self {
            Settlement::Value(value) => Some(Ok(value)),
            Settlement::Completed => None,
            Settlement::Failed(err) => Some(Err(err)),
        }
    }
}

impl<T, E> From<Option<Result<T, E>>> for Settlement<T, E> {
    fn from(item: Option<Result<T, E>>) -> Self {
        match item {
            Some(Ok(value)) => Settlement::Value(value),
            Some(Err(err)) => Settlement::Failed(err),
            None => Settlement::Completed,
        }
    }
}

/// An asynchronous producer of values which can be closed early.
///
/// Implementations must not be polled for a new element after they returned
/// [`Settlement::Completed`] or [`Settlement::Failed`]; the merge combinators
/// in this crate never do.
pub trait Source {
    /// Values yielded by the source.
    type Item;

    /// Failures raised by the source.
    type Error;

    /// Attempt to pull out the next settlement of this source.
    fn poll_advance(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>>;

    /// Ask the source to terminate early and release what it holds.
    ///
    /// Sources without cleanup obligations can rely on the default, which
    /// finishes immediately.
    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let _ = cx;
        Poll::Ready(Ok(()))
    }
}

/// A type-erased source, used to merge heterogeneous producers.
pub type BoxSource<'a, T, E> = Pin<Box<dyn Source<Item = T, Error = E> + Send + 'a>>;

/// A type-erased source which is not `Send`.
pub type LocalBoxSource<'a, T, E> = Pin<Box<dyn Source<Item = T, Error = E> + 'a>>;

impl<S> Source for &mut S
where
    S: Source + Unpin + ?Sized,
{
    type Item = S::Item;
    type Error = S::Error;

    fn poll_advance(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        S::poll_advance(Pin::new(&mut **self), cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        S::poll_close(Pin::new(&mut **self), cx)
    }
}

impl<S> Source for Box<S>
where
    S: Source + Unpin + ?Sized,
{
    type Item = S::Item;
    type Error = S::Error;

    fn poll_advance(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        Pin::new(&mut **self).poll_advance(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut **self).poll_close(cx)
    }
}

impl<P> Source for Pin<P>
where
    P: DerefMut + Unpin,
    P::Target: Source,
{
    type Item = <P::Target as Source>::Item;
    type Error = <P::Target as Source>::Error;

    fn poll_advance(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        self.get_mut().as_mut().poll_advance(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut().as_mut().poll_close(cx)
    }
}

/// Conversion into a [`Source`].
pub trait IntoSource {
    /// The type of the elements being produced.
    type Item;

    /// The type of failure the source can raise.
    type Error;

    /// Which kind of source are we turning this into?
    type IntoSource: Source<Item = Self::Item, Error = Self::Error>;

    /// Creates a source from a value.
    fn into_source(self) -> Self::IntoSource;
}

impl<S: Source> IntoSource for S {
    type Item = S::Item;
    type Error = S::Error;
    type IntoSource = S;

    #[inline]
    fn into_source(self) -> S {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use futures_lite::future::block_on;
    use futures_lite::stream;

    #[test]
    fn settlement_option_conversion() {
        let s: Settlement<u8, ()> = Some(Ok(1)).into();
        assert_eq!(s, Settlement::Value(1));
        let s: Settlement<u8, ()> = Some(Err(())).into();
        assert_eq!(s.into_option(), Some(Err(())));
        let s: Settlement<u8, ()> = None.into();
        assert_eq!(s, Settlement::Completed);
        assert!(!s.is_value());
    }

    #[test]
    fn boxed_sources_forward() {
        block_on(async {
            let a: BoxSource<'static, u8, core::convert::Infallible> =
                Box::pin(from_stream(stream::once(1)));
            let mut b = Box::new(a);
            assert_eq!(b.advance().await, Settlement::Value(1));
            assert_eq!(b.close().await, Ok(()));
            assert_eq!(b.advance().await, Settlement::Completed);
        })
    }
}
