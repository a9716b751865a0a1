//! Tower integration.
//!
//! [`RetryLayer`] installs the deferred retry loop around any cloneable `tower::Service`. Each
//! request gets its own loop: the policy is cloned, the request is cloned per attempt after the
//! attempt index has been injected, and the inner service is awaited for readiness before every
//! attempt. A readiness error counts as a failed attempt.
//!
//! ```rust
//! use secondwind::{FixedRetries, RetryLayer};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let calls = Arc::new(AtomicUsize::new(0));
//! let seen = calls.clone();
//! let svc = ServiceBuilder::new()
//!     .layer(RetryLayer::new(FixedRetries::new(2)))
//!     .service(service_fn(move |_: ()| {
//!         let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
//!         async move { if n < 3 { Err("busy") } else { Ok(n) } }
//!     }));
//! assert_eq!(svc.oneshot(()).await, Ok(3));
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # });
//! ```

use crate::attempts::{AttemptArgs, AttemptSlotLookup, AttemptSlotRegistry, MemberKey, SlotBinding};
use crate::mode::ExecutionMode;
use crate::outcome::Outcome;
use crate::policy::ContinuationPolicy;
use crate::retry::AttemptCursor;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::ServiceExt;
use tower_layer::Layer;
use tower_service::Service;

/// Tower-native retry layer.
#[derive(Clone)]
pub struct RetryLayer<P> {
    policy: P,
    binding: Option<SlotBinding>,
}

impl<P: fmt::Debug> fmt::Debug for RetryLayer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLayer")
            .field("policy", &self.policy)
            .field("member", &self.binding.as_ref().map(|b| &b.key))
            .finish()
    }
}

impl<P> RetryLayer<P> {
    /// Layer retrying according to `policy`.
    pub fn new(policy: P) -> Self {
        Self { policy, binding: None }
    }

    /// Inject attempt numbers into requests for `key`, using the process-wide registry.
    pub fn bind_attempts(self, key: MemberKey) -> Self {
        self.bind_attempts_in(AttemptSlotRegistry::global().clone(), key)
    }

    /// Inject attempt numbers into requests for `key`, using a specific lookup.
    pub fn bind_attempts_in<L>(mut self, lookup: L, key: MemberKey) -> Self
    where
        L: AttemptSlotLookup + 'static,
    {
        self.binding = Some(SlotBinding { key, lookup: Arc::new(lookup) });
        self
    }
}

impl<S, P: Clone> Layer<S> for RetryLayer<P> {
    type Service = RetryService<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService { inner, policy: self.policy.clone(), binding: self.binding.clone() }
    }
}

/// Retry service produced by `RetryLayer`.
#[derive(Clone)]
pub struct RetryService<S, P> {
    inner: S,
    policy: P,
    binding: Option<SlotBinding>,
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Debug for RetryService<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryService")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .field("member", &self.binding.as_ref().map(|b| &b.key))
            .finish()
    }
}

impl<S, P, Req> Service<Req> for RetryService<S, P>
where
    Req: AttemptArgs + Clone + Send + 'static,
    S: Service<Req> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    P: ContinuationPolicy<S::Response, S::Error> + Clone + Send + 'static,
    P::Decision: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // Take the instance that was driven to readiness and leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let mut policy = self.policy.clone();
        let binding = self.binding.clone();
        Box::pin(async move {
            let mut req = req;
            let mut cursor = AttemptCursor::new(binding.as_ref(), ExecutionMode::Deferred);
            loop {
                cursor.prepare(&mut req);
                let outcome: Outcome<S::Response, S::Error> = match inner.ready().await {
                    Ok(svc) => svc.call(req.clone()).await.into(),
                    Err(e) => Outcome::Failure(e),
                };
                let attempts = cursor.complete(&outcome);
                let decision = policy.should_retry(outcome.as_result(), attempts);
                let retry = decision.await;
                if !cursor.decided(retry) {
                    return cursor.finish(outcome);
                }
            }
        })
    }
}
