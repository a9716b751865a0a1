//! Execution mode selection.
//!
//! Every participant in a wrapped call (the operation and its continuation policy) declares
//! whether it completes immediately or yields something to await. The wrapped operation runs in
//! blocking mode only when all participants are immediate; if any of them is deferred the whole
//! loop is driven as a future.
//!
//! The choice is made once, in the type system, when the operation is wrapped:
//!
//! ```rust
//! use secondwind::mode::{is_asynchronous, Combine, Deferred, ExecutionMode, Immediate, Synchronicity};
//!
//! type Both = <Immediate as Combine<Immediate>>::Output;
//! type Mixed = <Immediate as Combine<Deferred>>::Output;
//! assert_eq!(<Both as Synchronicity>::MODE, ExecutionMode::Blocking);
//! assert_eq!(<Mixed as Synchronicity>::MODE, ExecutionMode::Deferred);
//! assert!(!is_asynchronous::<secondwind::FixedRetries>());
//! ```

use std::fmt;

/// How a wrapped operation drives its retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Runs to completion on the caller's stack; failures come back synchronously.
    Blocking,
    /// Returns a future; every attempt and every decision is awaited.
    Deferred,
}

impl ExecutionMode {
    /// Value-level form of the mode rule: deferred if either side is asynchronous.
    pub fn select(operation_is_async: bool, policy_is_async: bool) -> Self {
        if operation_is_async || policy_is_async {
            Self::Deferred
        } else {
            Self::Blocking
        }
    }

    /// True for [`ExecutionMode::Deferred`].
    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Deferred)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => write!(f, "blocking"),
            Self::Deferred => write!(f, "deferred"),
        }
    }
}

/// Type-level synchronicity marker.
pub trait Synchronicity: Send + Sync + 'static {
    /// Mode a loop made only of participants of this kind would run in.
    const MODE: ExecutionMode;
}

/// Participant completes immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

/// Participant yields a future.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deferred;

impl Synchronicity for Immediate {
    const MODE: ExecutionMode = ExecutionMode::Blocking;
}

impl Synchronicity for Deferred {
    const MODE: ExecutionMode = ExecutionMode::Deferred;
}

/// Join of two synchronicity kinds; `Deferred` absorbs.
pub trait Combine<Rhs: Synchronicity>: Synchronicity {
    /// Resulting kind.
    type Output: Synchronicity;
}

impl Combine<Immediate> for Immediate {
    type Output = Immediate;
}

impl Combine<Deferred> for Immediate {
    type Output = Deferred;
}

impl<Rhs: Synchronicity> Combine<Rhs> for Deferred {
    type Output = Deferred;
}

/// Async classification of a callable participant.
pub trait Classify {
    /// [`Immediate`] or [`Deferred`].
    type Kind: Synchronicity;
}

/// `true` if `C` yields futures rather than immediate values.
pub fn is_asynchronous<C: Classify + ?Sized>() -> bool {
    <C::Kind as Synchronicity>::MODE.is_deferred()
}

/// Mode selected for an operation `O` under policy `P`.
pub type Selected<O, P> =
    <<O as Classify>::Kind as Combine<<P as Classify>::Kind>>::Output;
