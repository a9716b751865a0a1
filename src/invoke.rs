//! Operations and the safe invoker.
//!
//! An operation is anything that can be called with a borrowed argument list and either
//! produces a value or fails. Whether it is immediate or asynchronous is declared by the adapter
//! it is wrapped in: [`SyncOp`] for plain closures returning `Result`, [`AsyncOp`] for closures
//! returning a future of `Result`.
//!
//! The safe invoker calls an operation exactly once and turns whatever happened into an
//! [`Outcome`]; an error never escapes past it.

use crate::mode::{Classify, Deferred, Immediate};
use crate::outcome::Outcome;
use futures::future::{ready, Ready};
use std::fmt;
use std::future::Future;

/// A callable unit that can be retried.
pub trait Operation<A>: Classify {
    /// Value produced on success.
    type Output;
    /// Error produced on failure.
    type Error;
    /// What one invocation yields. Immediate operations return [`Ready`].
    type Attempt: Future<Output = Result<Self::Output, Self::Error>>;

    /// Start one invocation against `args`.
    fn invoke(&mut self, args: &A) -> Self::Attempt;
}

/// Immediate operation: `FnMut(&A) -> Result<T, E>`.
#[derive(Clone, Copy)]
pub struct SyncOp<F>(pub F);

/// Asynchronous operation: `FnMut(&A) -> impl Future<Output = Result<T, E>>`.
#[derive(Clone, Copy)]
pub struct AsyncOp<F>(pub F);

impl<F> fmt::Debug for SyncOp<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncOp").field(&"<fn>").finish()
    }
}

impl<F> fmt::Debug for AsyncOp<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncOp").field(&"<fn>").finish()
    }
}

impl<F> Classify for SyncOp<F> {
    type Kind = Immediate;
}

impl<F> Classify for AsyncOp<F> {
    type Kind = Deferred;
}

impl<A, T, E, F> Operation<A> for SyncOp<F>
where
    F: FnMut(&A) -> Result<T, E>,
{
    type Output = T;
    type Error = E;
    type Attempt = Ready<Result<T, E>>;

    fn invoke(&mut self, args: &A) -> Self::Attempt {
        ready((self.0)(args))
    }
}

impl<A, T, E, F, Fut> Operation<A> for AsyncOp<F>
where
    F: FnMut(&A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    type Output = T;
    type Error = E;
    type Attempt = Fut;

    fn invoke(&mut self, args: &A) -> Self::Attempt {
        (self.0)(args)
    }
}

/// Wrap a plain closure as an immediate operation.
pub fn sync_op<A, T, E, F>(f: F) -> SyncOp<F>
where
    F: FnMut(&A) -> Result<T, E>,
{
    SyncOp(f)
}

/// Wrap a future-returning closure as an asynchronous operation.
pub fn async_op<A, T, E, F, Fut>(f: F) -> AsyncOp<F>
where
    F: FnMut(&A) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    AsyncOp(f)
}

/// Call an immediate operation once and capture the result.
pub fn invoke_safely<A, T, E, O>(operation: &mut O, args: &A) -> Outcome<T, E>
where
    O: Operation<A, Output = T, Error = E, Attempt = Ready<Result<T, E>>>,
{
    operation.invoke(args).into_inner().into()
}

/// Call any operation once, await it, and capture the result.
pub async fn invoke_safely_deferred<A, T, E, O>(operation: &mut O, args: &A) -> Outcome<T, E>
where
    O: Operation<A, Output = T, Error = E>,
{
    operation.invoke(args).await.into()
}
