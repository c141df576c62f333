use super::{IntoStream, OnClose, Settlement, Source};

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

/// An extension trait for the [`Source`] trait.
pub trait SourceExt: Source {
    /// Retrieve the next settlement of the source.
    fn advance(&mut self) -> Advance<'_, Self>
    where
        Self: Unpin,
    {
        Advance { source: self }
    }

    /// Ask the source to terminate early, waiting until it has done so.
    fn close(&mut self) -> Close<'_, Self>
    where
        Self: Unpin,
    {
        Close { source: self }
    }

    /// Run an asynchronous cleanup step once this source is closed.
    ///
    /// The cleanup runs after the source's own close finished, and never
    /// runs when the source ends on its own.
    fn on_close<F>(self, cleanup: F) -> OnClose<Self, F>
    where
        Self: Sized,
        F: Future<Output = Result<(), Self::Error>>,
    {
        OnClose::new(self, cleanup)
    }

    /// Turn this source into a `Stream` of `Result`s.
    fn into_stream(self) -> IntoStream<Self>
    where
        Self: Sized,
    {
        IntoStream::new(self)
    }
}

impl<S: Source + ?Sized> SourceExt for S {}

/// Future for the [`SourceExt::advance`] method.
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Advance<'a, S: ?Sized> {
    source: &'a mut S,
}

impl<S: Source + Unpin + ?Sized> Future for Advance<'_, S> {
    type Output = Settlement<S::Item, S::Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut *self.source).poll_advance(cx)
    }
}

/// Future for the [`SourceExt::close`] method.
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Close<'a, S: ?Sized> {
    source: &'a mut S,
}

impl<S: Source + Unpin + ?Sized> Future for Close<'_, S> {
    type Output = Result<(), S::Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut *self.source).poll_close(cx)
    }
}
