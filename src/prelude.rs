//! Convenient re-exports for common Second Wind types.
pub use crate::{
    attempts::{AttemptArgs, AttemptSlotRegistry, MemberKey},
    invoke::{AsyncOp, Operation, SyncOp},
    layer::RetryLayer,
    mode::ExecutionMode,
    outcome::Outcome,
    policy::{AsyncPredicate, ContinuationPolicy, FixedRetries, Predicate},
    retry::{wrap, Retry, Retrying},
    ConfigError, RetryConfig,
};
