//! Timeout budgets for blocking operations.

use std::time::{Duration, Instant};

/// How long a blocking call may take in total.
///
/// The budget covers the whole logical operation: a line that needs several
/// raw reads is charged for all of them against one deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Block until the operation completes.
    #[default]
    Never,
    /// Give up once this much wall-clock time has passed.
    After(Duration),
}

impl Timeout {
    /// Check once and return without blocking.
    pub const IMMEDIATE: Self = Self::After(Duration::ZERO);

    #[inline]
    pub const fn secs(secs: u64) -> Self {
        Self::After(Duration::from_secs(secs))
    }

    #[inline]
    pub const fn millis(millis: u64) -> Self {
        Self::After(Duration::from_millis(millis))
    }

    /// The budget, or `None` for [`Timeout::Never`].
    #[inline]
    pub const fn duration(self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::After(d) => Some(d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::After(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Self::Never, Self::After)
    }
}

/// A budget anchored to the monotonic clock at the start of an operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub(crate) fn start(timeout: Timeout) -> Self {
        Self {
            start: Instant::now(),
            budget: timeout.duration(),
        }
    }

    /// Time left, or `None` when unbounded.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(self.start.elapsed()))
    }

    /// The full budget, for error reporting.
    pub(crate) fn budget(&self) -> Duration {
        self.budget.unwrap_or(Duration::MAX)
    }
}
