use super::{Settlement, Source};

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{ready, Context, Poll};
use pin_project::pin_project;

/// A source with an asynchronous cleanup step.
///
/// This `struct` is created by the [`on_close`] method on [`SourceExt`]. See
/// its documentation for more.
///
/// [`on_close`]: crate::source::SourceExt::on_close
/// [`SourceExt`]: crate::source::SourceExt
#[pin_project]
pub struct OnClose<S, F> {
    #[pin]
    source: S,
    #[pin]
    cleanup: Option<F>,
    source_closed: bool,
}

impl<S, F> OnClose<S, F> {
    pub(crate) fn new(source: S, cleanup: F) -> Self {
        Self {
            source,
            cleanup: Some(cleanup),
            source_closed: false,
        }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for OnClose<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnClose")
            .field("source", &self.source)
            .field("cleanup_pending", &self.cleanup.is_some())
            .finish()
    }
}

impl<S, F> Source for OnClose<S, F>
where
    S: Source,
    F: Future<Output = Result<(), S::Error>>,
{
    type Item = S::Item;
    type Error = S::Error;

    fn poll_advance(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Settlement<Self::Item, Self::Error>> {
        let this = self.project();
        if *this.source_closed {
            return Poll::Ready(Settlement::Completed);
        }
        this.source.poll_advance(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let mut this = self.project();

        if !*this.source_closed {
            let res = ready!(this.source.poll_close(cx));
            *this.source_closed = true;
            if let Err(err) = res {
                this.cleanup.set(None);
                return Poll::Ready(Err(err));
            }
        }

        match this.cleanup.as_mut().as_pin_mut() {
            Some(cleanup) => {
                let res = ready!(cleanup.poll(cx));
                this.cleanup.set(None);
                Poll::Ready(res)
            }
            None => Poll::Ready(Ok(())),
        }
    }
}
