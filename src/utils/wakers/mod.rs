mod noop;
mod vec;

pub(crate) use noop::noop_waker;
pub(crate) use vec::*;
