//! Retry loop.
//!
//! Wraps an operation so that each call re-invokes it until its continuation policy says stop.
//!
//! Semantics:
//! - Each call starts from zero attempts; nothing is carried between calls.
//! - Before every invocation the attempt-slot binding (if any) is looked up and the zero-based
//!   attempt number is written into the declared argument.
//! - After every invocation the policy receives the unwrapped outcome and the one-based count of
//!   attempts completed.
//! - When the policy declines, a success is returned as-is and a failure is returned as the
//!   exact error of the last attempt. Earlier failures are dropped. No error type of this crate
//!   is ever substituted.
//! - Attempts follow each other immediately; there is no delay between them.
//!
//! Invariants:
//! - Attempt `n + 1` never starts before attempt `n` has been decided.
//! - The execution mode is fixed by the types of the operation and policy when wrapping:
//!   blocking only if both are immediate, deferred otherwise.
//!
//! Example
//! ```rust
//! use secondwind::{Retry, SyncOp};
//!
//! let mut calls = 0;
//! let mut flaky = Retry::times(2).wrap(SyncOp(|_: &()| {
//!     calls += 1;
//!     if calls < 3 { Err("not yet") } else { Ok(calls) }
//! }));
//! assert_eq!(flaky.call(()), Ok(3));
//! ```

use crate::attempts::{AttemptArgs, AttemptSlotLookup, AttemptSlotRegistry, MemberKey, SlotBinding};
use crate::invoke::{invoke_safely, invoke_safely_deferred, Operation};
use crate::mode::{Classify, Combine, Deferred, ExecutionMode, Immediate, Selected, Synchronicity};
use crate::outcome::Outcome;
use crate::policy::{AsyncPredicate, ContinuationPolicy, FixedRetries, Predicate};
use futures::future::Ready;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// Wrapping configuration: a continuation policy plus an optional attempt-slot binding.
#[derive(Clone)]
pub struct Retry<P> {
    policy: P,
    binding: Option<SlotBinding>,
}

impl<P: fmt::Debug> fmt::Debug for Retry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("policy", &self.policy)
            .field("member", &self.binding.as_ref().map(|b| &b.key))
            .finish()
    }
}

impl Retry<FixedRetries> {
    /// Retry failures up to `max` times (at most `max + 1` invocations per call).
    pub fn times(max: usize) -> Self {
        Self::new(FixedRetries::new(max))
    }
}

impl<F> Retry<Predicate<F>> {
    /// Retry while `f(outcome, attempts)` returns `true`.
    pub fn when<T, E>(f: F) -> Self
    where
        F: FnMut(Result<&T, &E>, usize) -> bool,
    {
        Self::new(Predicate(f))
    }
}

impl<F> Retry<AsyncPredicate<F>> {
    /// Retry while the future returned by `f(outcome, attempts)` resolves to `true`.
    pub fn when_async<T, E, Fut>(f: F) -> Self
    where
        F: FnMut(Result<&T, &E>, usize) -> Fut,
        Fut: Future<Output = bool>,
    {
        Self::new(AsyncPredicate(f))
    }
}

impl<P: Classify> Retry<P> {
    /// Configuration using `policy` with no attempt-slot binding.
    pub fn new(policy: P) -> Self {
        Self { policy, binding: None }
    }

    /// Inject attempt numbers for `key` using the process-wide registry.
    pub fn bind_attempts(self, key: MemberKey) -> Self {
        self.bind_attempts_in(AttemptSlotRegistry::global().clone(), key)
    }

    /// Inject attempt numbers for `key` using a specific lookup.
    pub fn bind_attempts_in<L>(mut self, lookup: L, key: MemberKey) -> Self
    where
        L: AttemptSlotLookup + 'static,
    {
        self.binding = Some(SlotBinding { key, lookup: Arc::new(lookup) });
        self
    }

    /// Policy this configuration wraps with.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Install the retry loop around `operation`; the execution mode is chosen here.
    pub fn wrap<O>(self, operation: O) -> Retrying<O, P, Selected<O, P>>
    where
        O: Classify,
        O::Kind: Combine<P::Kind>,
    {
        Retrying {
            operation,
            policy: self.policy,
            binding: self.binding,
            _mode: PhantomData,
        }
    }
}

/// Wrap `operation` with `policy` and no attempt-slot binding.
pub fn wrap<O, P>(operation: O, policy: P) -> Retrying<O, P, Selected<O, P>>
where
    O: Classify,
    P: Classify,
    O::Kind: Combine<P::Kind>,
{
    Retry::new(policy).wrap(operation)
}

/// An operation with the retry loop installed.
///
/// `M` is the selected mode: [`Immediate`] gives a blocking `call`, [`Deferred`] gives an
/// `async` `call`. Clones run independent loops.
#[derive(Clone)]
pub struct Retrying<O, P, M> {
    operation: O,
    policy: P,
    binding: Option<SlotBinding>,
    _mode: PhantomData<M>,
}

impl<O, P, M: Synchronicity> fmt::Debug for Retrying<O, P, M>
where
    O: fmt::Debug,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("operation", &self.operation)
            .field("policy", &self.policy)
            .field("member", &self.binding.as_ref().map(|b| &b.key))
            .field("mode", &M::MODE)
            .finish()
    }
}

impl<O, P, M: Synchronicity> Retrying<O, P, M> {
    /// Mode selected when wrapping.
    pub fn mode(&self) -> ExecutionMode {
        M::MODE
    }

    /// Bound continuation policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Member whose attempt slot is consulted, if bound.
    pub fn member(&self) -> Option<&MemberKey> {
        self.binding.as_ref().map(|b| &b.key)
    }

    /// Unwrap the original operation.
    pub fn into_inner(self) -> O {
        self.operation
    }
}

impl<O, P> Retrying<O, P, Immediate> {
    /// Run the loop to completion on the current thread.
    pub fn call<A, T, E>(&mut self, mut args: A) -> Result<T, E>
    where
        A: AttemptArgs,
        O: Operation<A, Output = T, Error = E, Attempt = Ready<Result<T, E>>>,
        P: ContinuationPolicy<T, E, Decision = Ready<bool>>,
    {
        let mut cursor = AttemptCursor::new(self.binding.as_ref(), ExecutionMode::Blocking);
        loop {
            cursor.prepare(&mut args);
            let outcome = invoke_safely(&mut self.operation, &args);
            let attempts = cursor.complete(&outcome);
            let retry = self.policy.should_retry(outcome.as_result(), attempts).into_inner();
            if !cursor.decided(retry) {
                return cursor.finish(outcome);
            }
        }
    }
}

impl<O, P> Retrying<O, P, Deferred> {
    /// Drive the loop as a future, awaiting each attempt and each decision.
    pub async fn call<A, T, E>(&mut self, mut args: A) -> Result<T, E>
    where
        A: AttemptArgs,
        O: Operation<A, Output = T, Error = E>,
        P: ContinuationPolicy<T, E>,
    {
        let mut cursor = AttemptCursor::new(self.binding.as_ref(), ExecutionMode::Deferred);
        loop {
            cursor.prepare(&mut args);
            let outcome = invoke_safely_deferred(&mut self.operation, &args).await;
            let attempts = cursor.complete(&outcome);
            let decision = self.policy.should_retry(outcome.as_result(), attempts);
            let retry = decision.await;
            if !cursor.decided(retry) {
                return cursor.finish(outcome);
            }
        }
    }
}

/// Per-call bookkeeping shared by both loops.
pub(crate) struct AttemptCursor<'a> {
    attempts: usize,
    binding: Option<&'a SlotBinding>,
    mode: ExecutionMode,
}

impl<'a> AttemptCursor<'a> {
    pub(crate) fn new(binding: Option<&'a SlotBinding>, mode: ExecutionMode) -> Self {
        Self { attempts: 0, binding, mode }
    }

    /// Inject the zero-based attempt index if a slot is bound.
    pub(crate) fn prepare<A: AttemptArgs>(&self, args: &mut A) {
        if let Some(binding) = self.binding {
            binding.apply(args, self.attempts);
        }
    }

    /// Count the attempt just made; returns the one-based total.
    pub(crate) fn complete<T, E>(&mut self, outcome: &Outcome<T, E>) -> usize {
        self.attempts += 1;
        debug!(
            attempt = self.attempts,
            mode = %self.mode,
            failed = outcome.is_failure(),
            "retry attempt completed"
        );
        self.attempts
    }

    pub(crate) fn decided(&self, retry: bool) -> bool {
        trace!(attempts = self.attempts, retry, "retry decision");
        retry
    }

    pub(crate) fn finish<T, E>(&self, outcome: Outcome<T, E>) -> Result<T, E> {
        if outcome.is_failure() && self.attempts > 1 {
            debug!(attempts = self.attempts, "retry loop gave up; returning last failure");
        }
        outcome.into_result()
    }
}
