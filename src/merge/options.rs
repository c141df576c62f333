use core::fmt;
use core::num::NonZeroUsize;
use core::str::FromStr;

/// How the sources that are still active get closed when a merge stops early.
///
/// A merge stops early when the consumer closes it before all sources were
/// exhausted, or when one of the sources fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Drop the remaining sources without closing them.
    NoClose,
    /// Ask every remaining source to close, without waiting for it and
    /// without looking at the outcome.
    #[default]
    CloseNoWait,
    /// Close every remaining source and wait until all of them are done. A
    /// failure raised while closing is propagated to the consumer.
    CloseAndWait,
}

impl Mode {
    /// The canonical name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::NoClose => "no-close",
            Mode::CloseNoWait => "close-no-wait",
            Mode::CloseAndWait => "close-and-wait",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing a [`Mode`] from an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown merge mode `{name}`, expected one of `no-close`, `close-no-wait` or `close-and-wait`")]
pub struct ParseModeError {
    name: String,
}

impl ParseModeError {
    /// The name which failed to parse.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    /// Parses the canonical names, as well as the `iters-*` spellings.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures_fanin::Mode;
    ///
    /// assert_eq!("close-and-wait".parse(), Ok(Mode::CloseAndWait));
    /// assert_eq!("iters-noclose".parse(), Ok(Mode::NoClose));
    /// assert!("close-eventually".parse::<Mode>().is_err());
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "no-close" | "iters-noclose" => Ok(Mode::NoClose),
            "close-no-wait" | "iters-close-nowait" => Ok(Mode::CloseNoWait),
            "close-and-wait" | "iters-close-wait" => Ok(Mode::CloseAndWait),
            _ => Err(ParseModeError {
                name: name.to_owned(),
            }),
        }
    }
}

/// Configuration of a single merge.
///
/// # Examples
///
/// ```
/// use futures_fanin::{MergeOptions, Mode};
///
/// let options = MergeOptions::new().mode(Mode::CloseAndWait).concurrency(2);
/// assert_eq!(options.get_mode(), Mode::CloseAndWait);
/// assert_eq!(options.get_concurrency().map(|n| n.get()), Some(2));
///
/// // zero means "no limit"
/// assert_eq!(MergeOptions::new().concurrency(0).get_concurrency(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    mode: Mode,
    concurrency: Option<NonZeroUsize>,
}

impl MergeOptions {
    /// Unbounded concurrency, closing with [`Mode::CloseNoWait`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the closing policy.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Limit how many sources are read from at once. `0` means unbounded.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = NonZeroUsize::new(limit);
        self
    }

    /// The closing policy.
    pub fn get_mode(&self) -> Mode {
        self.mode
    }

    /// The concurrency limit, `None` if unbounded.
    pub fn get_concurrency(&self) -> Option<NonZeroUsize> {
        self.concurrency
    }
}

impl From<Mode> for MergeOptions {
    fn from(mode: Mode) -> Self {
        Self::new().mode(mode)
    }
}
