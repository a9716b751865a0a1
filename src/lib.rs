#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Second Wind
//!
//! A retry combinator for synchronous and asynchronous Rust: wrap an operation, give it a
//! continuation policy, and every call re-invokes it until the policy says stop.
//!
//! ## Features
//!
//! - **One loop, two modes**: blocking when the operation and policy are both immediate,
//!   deferred (a future) as soon as either is asynchronous
//! - **Continuation policies**: a fixed retry budget, or a predicate over the last outcome that
//!   can look at success values as well as errors
//! - **Failures as values**: the policy sees `Ok(&value)` or `Err(&error)` through one signature
//! - **Attempt-index injection**: a registry maps a member to the argument slot that receives
//!   the zero-based attempt number
//! - **Tower layer** running the same loop around any cloneable service
//!
//! There is no backoff, jitter or delay: attempts follow each other immediately.
//!
//! ## Quick Start
//!
//! ```rust
//! use secondwind::{AsyncOp, Retry, SyncOp};
//!
//! // Blocking: both the operation and the policy are immediate.
//! let mut tries = 0;
//! let mut parse = Retry::times(2).wrap(SyncOp(|input: &String| {
//!     tries += 1;
//!     if tries < 2 { Err("transient") } else { input.parse::<u32>().map_err(|_| "bad input") }
//! }));
//! assert_eq!(parse.call("42".to_string()), Ok(42));
//!
//! // Deferred: the predicate keeps going while the response is flagged.
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut fetch = Retry::when(|out: Result<&(u32, bool), &String>, attempts| {
//!     matches!(out, Ok((_, true))) && attempts < 5
//! })
//! .wrap(AsyncOp(|_: &()| async { Ok::<_, String>((7, false)) }));
//! assert_eq!(fetch.call(()).await, Ok((7, false)));
//! # });
//! ```

pub mod attempts;
pub mod config;
pub mod error;
pub mod invoke;
pub mod layer;
pub mod mode;
pub mod outcome;
pub mod policy;
pub mod prelude;
pub mod retry;

// Re-exports
pub use attempts::{AttemptArg, AttemptArgs, AttemptSlotLookup, AttemptSlotRegistry, MemberKey};
pub use config::RetryConfig;
pub use error::ConfigError;
pub use invoke::{async_op, invoke_safely, invoke_safely_deferred, sync_op, AsyncOp, Operation, SyncOp};
pub use layer::{RetryLayer, RetryService};
pub use mode::{Classify, ExecutionMode};
pub use outcome::Outcome;
pub use policy::{
    async_predicate, predicate, retries, AsyncPredicate, ContinuationPolicy, FixedRetries,
    Predicate,
};
pub use retry::{wrap, Retry, Retrying};
