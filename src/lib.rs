//! Fan-in for asynchronous sources.
//!
//! This library merges any number of independently paced asynchronous
//! producers into a single sequence, yielding whichever value settles first.
//! It adds two things on top of a plain stream merge:
//!
//! - **bounded concurrency**: at most `concurrency` sources are read from at
//!   once; the others wait in a FIFO backlog until a slot frees up.
//! - **controlled shutdown**: when the merge stops early, either because the
//!   consumer closes it or because a source fails, the sources which are
//!   still active are closed according to a [`Mode`].
//!
//! # Operations
//!
//! - [`merge`]: merge a `Vec` of sources with the given [`MergeOptions`].
//! - [`Merge`]: the same, as a method on vecs and arrays of sources.
//! - [`source`]: the [`Source`][source::Source] trait and adapters turning
//!   streams into sources.
//!
//! # Examples
//!
//! ```rust
//! use futures_fanin::prelude::*;
//! use futures_fanin::{source, MergeOptions, Mode};
//! use futures_lite::future::block_on;
//! use futures_lite::stream;
//!
//! block_on(async {
//!     let a = source::from_stream(stream::repeat("a"));
//!     let b = source::from_stream(stream::repeat("b"));
//!     let c = source::from_stream(stream::repeat("c"));
//!
//!     let options = MergeOptions::new().mode(Mode::CloseAndWait).concurrency(2);
//!     let mut s = vec![a, b, c].merge_with(options);
//!
//!     assert_eq!(s.advance().await.into_option(), Some(Ok("a")));
//!     assert_eq!(s.advance().await.into_option(), Some(Ok("b")));
//!     assert_eq!(s.queued_len(), 1);
//!
//!     // stop early, closing `a` and `b`
//!     s.close().await.unwrap();
//!     assert!(s.is_terminated());
//! })
//! ```

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

mod merge;
mod utils;

pub mod source;

/// The fan-in prelude.
pub mod prelude {
    pub use super::merge::Merge as _;
    pub use super::source::IntoSource as _;
    pub use super::source::SourceExt as _;
}

pub use merge::{Merge, MergeOptions, Mode, ParseModeError};

/// Helper functions and types for contiguous growable array type with heap-allocated contents,
/// written `Vec<T>`.
pub mod vec {
    pub use crate::merge::vec::Merge;
}

/// Merge `sources` into a single source of all their outputs.
///
/// `options` is anything convertible into [`MergeOptions`], including a bare
/// [`Mode`].
///
/// # Examples
///
/// ```
/// use futures_fanin::{merge, source, Mode};
/// use futures_lite::future::block_on;
/// use futures_lite::{stream, StreamExt};
///
/// block_on(async {
///     let a = source::from_stream(stream::iter(vec![1, 2]));
///     let b = source::from_stream(stream::iter(vec![3]));
///     let s = merge(vec![a, b], Mode::NoClose);
///
///     let out: Vec<_> = s.map(Result::unwrap).collect().await;
///     assert_eq!(out, vec![1, 3, 2]);
/// })
/// ```
pub fn merge<S>(sources: Vec<S>, options: impl Into<MergeOptions>) -> vec::Merge<S::IntoSource>
where
    S: source::IntoSource,
{
    Merge::merge_with(sources, options)
}
