use crate::source::IntoSource;

use core::pin::Pin;
use slab::Slab;

pub use options::{MergeOptions, Mode, ParseModeError};

mod options;
mod shutdown;
pub(crate) mod vec;
mod window;

/// The sources a merge is currently reading from, keyed by slot.
pub(crate) type PendingSet<S> = Slab<Pin<Box<S>>>;

/// Combines multiple sources into a single source of all their outputs.
///
/// Values are yielded as soon as they're received, and the merge keeps going
/// until every source has been exhausted, a source fails, or the merge is
/// closed. The output ordering between sources is not guaranteed; the order
/// of values coming out of any single source is preserved.
///
/// # Examples
///
/// ```
/// use futures_fanin::prelude::*;
/// use futures_fanin::source;
/// use futures_lite::stream::{self, StreamExt};
/// use futures_lite::future::block_on;
///
/// block_on(async {
///     let a = source::from_stream(stream::once(1));
///     let b = source::from_stream(stream::once(2));
///     let c = source::from_stream(stream::once(3));
///     let s = vec![a, b, c].merge();
///
///     let mut buf: Vec<_> = s.map(Result::unwrap).collect().await;
///     buf.sort_unstable();
///     assert_eq!(&buf, &[1, 2, 3]);
/// })
/// ```
pub trait Merge {
    /// The resulting output type.
    type Item;

    /// The failure type shared by all sources.
    type Error;

    /// The merged source type.
    type Source;

    /// Combine multiple sources into a single source using the default
    /// [`MergeOptions`].
    fn merge(self) -> Self::Source
    where
        Self: Sized,
    {
        self.merge_with(MergeOptions::default())
    }

    /// Combine multiple sources into a single source.
    fn merge_with(self, options: impl Into<MergeOptions>) -> Self::Source;
}

impl<S> Merge for Vec<S>
where
    S: IntoSource,
{
    type Item = S::Item;
    type Error = S::Error;
    type Source = vec::Merge<S::IntoSource>;

    fn merge_with(self, options: impl Into<MergeOptions>) -> Self::Source {
        vec::Merge::new(
            self.into_iter().map(IntoSource::into_source).collect(),
            options.into(),
        )
    }
}

impl<S, const N: usize> Merge for [S; N]
where
    S: IntoSource,
{
    type Item = S::Item;
    type Error = S::Error;
    type Source = vec::Merge<S::IntoSource>;

    fn merge_with(self, options: impl Into<MergeOptions>) -> Self::Source {
        vec::Merge::new(
            self.into_iter().map(IntoSource::into_source).collect(),
            options.into(),
        )
    }
}
