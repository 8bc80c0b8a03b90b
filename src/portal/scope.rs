use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{AbortHandle, Abortable};

/// The page scope was torn down before the request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request dropped: page scope was torn down")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct ScopeState {
    torn_down: bool,
    next_id: u64,
    handles: HashMap<u64, AbortHandle>,
}

/// Ties requests to the lifetime of one mounted page.
///
/// Requests run through [`PageScope::run`] are aborted on [`PageScope::teardown`]
/// or when the scope is dropped, so their results never reach a page that
/// is gone.
#[derive(Debug, Default)]
pub struct PageScope {
    state: Mutex<ScopeState>,
}

/// Unregisters a request's abort handle once it settles or is dropped.
struct Registration<'a> {
    scope: &'a PageScope,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.scope.lock().handles.remove(&self.id);
    }
}

impl PageScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = {
            let mut state = self.lock();
            if state.torn_down {
                return Err(Cancelled);
            }
            let id = state.next_id;
            state.next_id += 1;
            state.handles.insert(id, handle);
            id
        };
        let _registered = Registration { scope: self, id };
        Abortable::new(fut, registration).await.map_err(|_| Cancelled)
    }

    pub fn teardown(&self) {
        let mut state = self.lock();
        if !state.torn_down {
            tracing::debug!(in_flight = state.handles.len(), "Tearing down page scope");
        }
        state.torn_down = true;
        for (_, handle) in state.handles.drain() {
            handle.abort();
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.lock().torn_down
    }
}

impl Drop for PageScope {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::{Cancelled, PageScope};

    #[tokio::test]
    async fn completed_request_passes_through() {
        let scope = PageScope::new();
        assert_eq!(scope.run(async { 42 }).await, Ok(42));
    }

    #[tokio::test]
    async fn teardown_cancels_in_flight_request() {
        let scope = Arc::new(PageScope::new());
        let started = Arc::new(Notify::new());

        let task = {
            let scope = Arc::clone(&scope);
            let started = Arc::clone(&started);
            tokio::spawn(async move {
                scope
                    .run(async move {
                        started.notify_one();
                        std::future::pending::<()>().await
                    })
                    .await
            })
        };

        started.notified().await;
        scope.teardown();
        assert_eq!(task.await.expect("join"), Err(Cancelled));
        assert!(scope.is_torn_down());
    }

    #[tokio::test]
    async fn settled_requests_release_their_handles() {
        let scope = PageScope::new();
        for n in 0..50 {
            assert_eq!(scope.run(async move { n }).await, Ok(n));
        }
        assert!(scope.lock().handles.is_empty());

        let dropped = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            scope.run(std::future::pending::<()>()),
        )
        .await;
        assert!(dropped.is_err());
        assert!(scope.lock().handles.is_empty());
    }

    #[test]
    fn teardown_wakes_pending_request() {
        let scope = PageScope::new();
        let mut fut = tokio_test::task::spawn(scope.run(std::future::pending::<()>()));
        tokio_test::assert_pending!(fut.poll());

        scope.teardown();
        assert!(fut.is_woken());
        assert_eq!(tokio_test::assert_ready!(fut.poll()), Err(Cancelled));
    }

    #[tokio::test]
    async fn requests_after_teardown_are_refused() {
        let scope = PageScope::new();
        scope.teardown();
        assert_eq!(scope.run(async { 1 }).await, Err(Cancelled));
    }
}
