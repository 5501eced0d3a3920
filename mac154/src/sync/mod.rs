//! Executor-independent synchronization primitives.
//!
//! Everything here is meant to synchronize activities that run
//! cooperatively inside a single task: the TSCH state machine, the upper
//! layer producers, and the driver callbacks. None of the primitives are
//! `Send`; they compose through [`select`] and [`join`] rather than
//! through threads.
//!
//! [`select`]: select::select
//! [`join`]: join::join

pub mod channel;
pub mod join;
pub mod mutex;
pub mod select;
pub mod yield_now;

/// One of two possible outcomes.
#[derive(Debug, PartialEq, Eq)]
pub enum Either<T, S> {
    /// The first outcome.
    First(T),
    /// The second outcome.
    Second(S),
}

impl<T, S> Either<T, S> {
    /// Returns `true` for the first outcome.
    pub fn is_first(&self) -> bool {
        matches!(self, Either::First(_))
    }

    /// Returns `true` for the second outcome.
    pub fn is_second(&self) -> bool {
        matches!(self, Either::Second(_))
    }
}
