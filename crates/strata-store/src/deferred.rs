use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::{StoreError, StoreResult};

type BoxedFuture<T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'static>>;

/// Handle to the outcome of an asynchronous backend operation.
///
/// The caller gets the handle as soon as the operation is dispatched and
/// awaits it when the result is needed. [`Deferred::map`] chains a
/// transform that runs exactly once, after the operation completes.
#[must_use = "a deferred result does nothing unless awaited"]
pub struct Deferred<T> {
    inner: BoxedFuture<T>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Wrap an arbitrary future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = StoreResult<T>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    /// An already-known outcome.
    pub fn ready(result: StoreResult<T>) -> Self {
        Self::new(std::future::ready(result))
    }

    /// Start `future` on the tokio runtime now, rather than on first poll.
    ///
    /// Must be called from within a runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = StoreResult<T>> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        Self::new(async move {
            handle
                .await
                .map_err(|e| StoreError::Task(e.to_string()))?
        })
    }

    /// Transform the successful outcome. Failures pass through untouched.
    pub fn map<U, F>(self, transform: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Deferred::new(async move { self.await.map(transform) })
    }
}

impl<T> Future for Deferred<T> {
    type Output = StoreResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn ready_resolves_immediately() {
        assert_eq!(Deferred::ready(Ok(5)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn map_runs_once_after_completion() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let deferred = Deferred::ready(Ok(2)).map(move |v| {
            seen.fetch_add(1, Ordering::SeqCst);
            v * 10
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(deferred.await.unwrap(), 20);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn map_is_skipped_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let deferred = Deferred::<i32>::ready(Err(StoreError::Unavailable("down".into())))
            .map(move |v| {
                seen.fetch_add(1, Ordering::SeqCst);
                v
            });
        assert!(matches!(deferred.await, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn spawn_starts_before_await() {
        let started = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&started);
        let deferred = Deferred::spawn(async move {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok("done")
        });
        tokio::task::yield_now().await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(deferred.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn panicking_task_is_a_task_error() {
        let deferred: Deferred<()> = Deferred::spawn(async {
            if true {
                panic!("boom");
            }
            Ok(())
        });
        assert!(matches!(deferred.await, Err(StoreError::Task(_))));
    }
}
