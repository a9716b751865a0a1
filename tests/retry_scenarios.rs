use secondwind::{AsyncOp, ExecutionMode, Retry, SyncOp};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("attempt {0} failed")]
struct AttemptFailed(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    attempts: usize,
    need_retry: bool,
}

/// Fails on the first two calls, then returns the call count.
fn third_time_works(counter: Arc<AtomicUsize>) -> impl FnMut(&()) -> Result<usize, AttemptFailed> + Clone {
    move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= 2 {
            Err(AttemptFailed(n))
        } else {
            Ok(n)
        }
    }
}

/// Flags the first two replies as needing another try.
fn flagged_twice(counter: Arc<AtomicUsize>) -> impl FnMut(&()) -> Result<Reply, AttemptFailed> {
    move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Reply { attempts: n, need_retry: n <= 2 })
    }
}

#[test]
fn sync_retries_twice_then_succeeds() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut wrapped = Retry::times(2).wrap(SyncOp(third_time_works(counter.clone())));
    assert_eq!(wrapped.mode(), ExecutionMode::Blocking);

    assert_eq!(wrapped.call(()), Ok(3));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn sync_fails_with_error_from_last_attempt() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut wrapped = Retry::times(1).wrap(SyncOp(third_time_works(counter.clone())));

    assert_eq!(wrapped.call(()), Err(AttemptFailed(2)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn zero_retries_means_one_call() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut wrapped = Retry::times(0).wrap(SyncOp(third_time_works(counter.clone())));

    assert_eq!(wrapped.call(()), Err(AttemptFailed(1)));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn async_retries_twice_then_succeeds() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut op = third_time_works(counter.clone());
    let mut wrapped = Retry::times(2).wrap(AsyncOp(move |args: &()| {
        let result = op(args);
        async move {
            tokio::task::yield_now().await;
            result
        }
    }));
    assert_eq!(wrapped.mode(), ExecutionMode::Deferred);

    assert_eq!(wrapped.call(()).await, Ok(3));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn async_rejects_with_error_from_last_attempt() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut op = third_time_works(counter.clone());
    let mut wrapped = Retry::times(1).wrap(AsyncOp(move |args: &()| {
        let result = op(args);
        async move { result }
    }));

    assert_eq!(wrapped.call(()).await, Err(AttemptFailed(2)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn predicate_retries_flagged_success() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut wrapped = Retry::when(|reply: Result<&Reply, &AttemptFailed>, _| {
        matches!(reply, Ok(r) if r.need_retry)
    })
    .wrap(SyncOp(flagged_twice(counter.clone())));

    assert_eq!(wrapped.call(()), Ok(Reply { attempts: 3, need_retry: false }));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn async_predicate_over_sync_operation() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut wrapped = Retry::when_async(|reply: Result<&Reply, &AttemptFailed>, _| {
        let need_retry = matches!(reply, Ok(r) if r.need_retry);
        async move { need_retry }
    })
    .wrap(SyncOp(flagged_twice(counter.clone())));
    assert_eq!(wrapped.mode(), ExecutionMode::Deferred);

    assert_eq!(wrapped.call(()).await, Ok(Reply { attempts: 3, need_retry: false }));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn async_predicate_bounded_by_attempts() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut wrapped = Retry::when_async(|reply: Result<&Reply, &AttemptFailed>, attempts| {
        let need_retry = matches!(reply, Ok(r) if r.need_retry);
        async move { need_retry && attempts <= 1 }
    })
    .wrap(SyncOp(flagged_twice(counter.clone())));

    assert_eq!(wrapped.call(()).await, Ok(Reply { attempts: 2, need_retry: true }));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn predicate_sees_each_attempt_once_with_one_based_count() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut seen = Vec::new();
    {
        let mut wrapped = Retry::when(|outcome: Result<&usize, &AttemptFailed>, attempts| {
            seen.push((outcome.map(|v| *v).map_err(|e| e.clone()), attempts));
            outcome.is_err()
        })
        .wrap(SyncOp(third_time_works(counter)));
        assert_eq!(wrapped.call(()), Ok(3));
    }
    assert_eq!(
        seen,
        vec![(Err(AttemptFailed(1)), 1), (Err(AttemptFailed(2)), 2), (Ok(3), 3)]
    );
}

#[tokio::test]
async fn clones_run_independent_loops() {
    let counter = Arc::new(AtomicUsize::new(0));
    let attempts_seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorder = attempts_seen.clone();
    let wrapped = Retry::when(move |_: Result<&(), &AttemptFailed>, attempts| {
        recorder.lock().unwrap().push(attempts);
        attempts < 3
    })
    .wrap(AsyncOp(move |_: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::task::yield_now().await;
            Ok::<_, AttemptFailed>(())
        }
    }));

    let mut a = wrapped.clone();
    let mut b = wrapped;
    let (ra, rb) = tokio::join!(a.call(()), b.call(()));
    assert_eq!(ra, Ok(()));
    assert_eq!(rb, Ok(()));

    let mut seen = attempts_seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 1, 2, 2, 3, 3], "each call counts from one on its own");
}
