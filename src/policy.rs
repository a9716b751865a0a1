//! Continuation policies.
//!
//! After every attempt the retry loop asks its policy whether to go again, passing the unwrapped
//! outcome (`Ok(&value)` or `Err(&error)`) and the number of attempts completed so far, counting
//! from 1. Policies may answer immediately or with a future; asynchronous policies force the
//! wrapped operation into deferred mode.
//!
//! Semantics:
//! - [`FixedRetries`] retries while the last attempt failed and `attempts <= max`. With
//!   `max = n` the operation is invoked at most `n + 1` times; `max = 0` means a single call.
//! - [`Predicate`] / [`AsyncPredicate`] hand the decision to caller code, which may look at
//!   success values too (e.g. a response flagged as needing another try).
//! - Nothing bounds a predicate that always answers `true`.
//! - A predicate that panics is not caught; the panic leaves the wrapped call.

use crate::mode::{Classify, Deferred, Immediate};
use futures::future::{ready, Ready};
use std::fmt;
use std::future::Future;

/// Decision function consulted after each attempt.
pub trait ContinuationPolicy<T, E>: Classify {
    /// Yields `true` to retry. Immediate policies return [`Ready`].
    type Decision: Future<Output = bool>;

    /// Decide whether to invoke the operation again.
    fn should_retry(&mut self, outcome: Result<&T, &E>, attempts: usize) -> Self::Decision;
}

/// Retry failures up to `max` times after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FixedRetries {
    max: usize,
}

impl FixedRetries {
    /// Retry budget of `max` (total invocations up to `max + 1`).
    pub const fn new(max: usize) -> Self {
        Self { max }
    }

    /// Configured retry budget.
    pub const fn max(&self) -> usize {
        self.max
    }

    /// The raw rule, usable without a policy instance.
    pub fn permits<T, E>(&self, outcome: Result<&T, &E>, attempts: usize) -> bool {
        outcome.is_err() && attempts <= self.max
    }
}

impl From<usize> for FixedRetries {
    fn from(max: usize) -> Self {
        Self::new(max)
    }
}

impl Classify for FixedRetries {
    type Kind = Immediate;
}

impl<T, E> ContinuationPolicy<T, E> for FixedRetries {
    type Decision = Ready<bool>;

    fn should_retry(&mut self, outcome: Result<&T, &E>, attempts: usize) -> Self::Decision {
        ready(self.permits(outcome, attempts))
    }
}

/// Caller-supplied immediate decision function.
#[derive(Clone, Copy)]
pub struct Predicate<F>(pub F);

/// Caller-supplied decision function returning a future.
///
/// The closure sees the borrowed outcome synchronously; the future it returns must own whatever
/// it needs.
#[derive(Clone, Copy)]
pub struct AsyncPredicate<F>(pub F);

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&"<predicate>").finish()
    }
}

impl<F> fmt::Debug for AsyncPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncPredicate").field(&"<predicate>").finish()
    }
}

impl<F> Classify for Predicate<F> {
    type Kind = Immediate;
}

impl<F> Classify for AsyncPredicate<F> {
    type Kind = Deferred;
}

impl<T, E, F> ContinuationPolicy<T, E> for Predicate<F>
where
    F: FnMut(Result<&T, &E>, usize) -> bool,
{
    type Decision = Ready<bool>;

    fn should_retry(&mut self, outcome: Result<&T, &E>, attempts: usize) -> Self::Decision {
        ready((self.0)(outcome, attempts))
    }
}

impl<T, E, F, Fut> ContinuationPolicy<T, E> for AsyncPredicate<F>
where
    F: FnMut(Result<&T, &E>, usize) -> Fut,
    Fut: Future<Output = bool>,
{
    type Decision = Fut;

    fn should_retry(&mut self, outcome: Result<&T, &E>, attempts: usize) -> Self::Decision {
        (self.0)(outcome, attempts)
    }
}

/// Fixed retry budget.
pub const fn retries(max: usize) -> FixedRetries {
    FixedRetries::new(max)
}

/// Immediate predicate policy.
pub fn predicate<T, E, F>(f: F) -> Predicate<F>
where
    F: FnMut(Result<&T, &E>, usize) -> bool,
{
    Predicate(f)
}

/// Asynchronous predicate policy.
pub fn async_predicate<T, E, F, Fut>(f: F) -> AsyncPredicate<F>
where
    F: FnMut(Result<&T, &E>, usize) -> Fut,
    Fut: Future<Output = bool>,
{
    AsyncPredicate(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Failed;

    fn decide<P: ContinuationPolicy<u8, Failed, Decision = Ready<bool>>>(
        policy: &mut P,
        outcome: Result<&u8, &Failed>,
        attempts: usize,
    ) -> bool {
        policy.should_retry(outcome, attempts).into_inner()
    }

    #[test]
    fn fixed_retries_boundary() {
        let mut policy = retries(2);
        assert!(decide(&mut policy, Err(&Failed), 1));
        assert!(decide(&mut policy, Err(&Failed), 2));
        assert!(!decide(&mut policy, Err(&Failed), 3));
    }

    #[test]
    fn fixed_retries_never_retries_success() {
        let mut policy = FixedRetries::from(10);
        assert!(!decide(&mut policy, Ok(&1), 1));
    }

    #[test]
    fn zero_budget_allows_single_attempt() {
        let mut policy = retries(0);
        assert_eq!(policy.max(), 0);
        assert!(!decide(&mut policy, Err(&Failed), 1));
    }

    #[test]
    fn predicate_sees_success_values() {
        let mut seen = Vec::new();
        let mut policy = predicate(|outcome: Result<&u8, &Failed>, attempts| {
            seen.push(attempts);
            matches!(outcome, Ok(v) if *v == 0)
        });
        assert!(decide(&mut policy, Ok(&0), 1));
        assert!(!decide(&mut policy, Ok(&7), 2));
        drop(policy);
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn async_predicate_is_awaited() {
        let mut policy = async_predicate(|outcome: Result<&u8, &Failed>, attempts| {
            let failed = outcome.is_err();
            async move {
                tokio::task::yield_now().await;
                failed && attempts < 3
            }
        });
        assert!(policy.should_retry(Err(&Failed), 1).await);
        assert!(!policy.should_retry(Err(&Failed), 3).await);
        assert!(!policy.should_retry(Ok(&1), 1).await);
    }
}
