use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use parrot_core::RequestError;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::queue::{Priority, RequestQueue};
use crate::retry::{RetryDecision, RetryPolicy};

const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;

/// Performs one network call for a queued request.
#[async_trait]
pub trait RequestExecutor: Send + Sync + 'static {
    type Request: Clone + Debug + Send + Sync + 'static;
    type Response: Send + 'static;

    async fn execute(&self, request: &Self::Request) -> Result<Self::Response, RequestError>;
}

/// Terminal outcome of a dispatched request.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("request failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: RequestError },

    #[error("request rejected: {0}")]
    Rejected(RequestError),

    #[error("scheduler worker stopped before responding")]
    WorkerGone,

    #[error("request aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Minimum spacing between the start of two consecutive dispatches.
    pub min_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(DEFAULT_MIN_INTERVAL_MS),
            retry: RetryPolicy::default(),
        }
    }
}

type Queue<E> = RequestQueue<
    <E as RequestExecutor>::Request,
    <E as RequestExecutor>::Response,
    DispatchError,
>;

struct SchedulerState<E: RequestExecutor> {
    queue: Queue<E>,
    draining: bool,
    last_dispatch: Option<Instant>,
}

struct Inner<E: RequestExecutor> {
    executor: E,
    config: SchedulerConfig,
    state: Mutex<SchedulerState<E>>,
}

/// Serializes every outbound call through one drain worker.
///
/// At most one request executes at any instant. Dispatch starts are spaced
/// by at least `min_interval`. A failing request only fails its own future.
pub struct RequestScheduler<E: RequestExecutor> {
    inner: Arc<Inner<E>>,
}

impl<E: RequestExecutor> Clone for RequestScheduler<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: RequestExecutor> RequestScheduler<E> {
    pub fn new(executor: E, config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                executor,
                config,
                state: Mutex::new(SchedulerState {
                    queue: RequestQueue::default(),
                    draining: false,
                    last_dispatch: None,
                }),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn executor(&self) -> &E {
        &self.inner.executor
    }

    /// Enqueue `request` immediately and return a future for its outcome.
    ///
    /// Must be called inside a tokio runtime: an idle scheduler spawns its
    /// drain worker here.
    pub fn submit(
        &self,
        request: E::Request,
        priority: Priority,
    ) -> impl Future<Output = Result<E::Response, DispatchError>> + Send + use<E> {
        let (response_tx, response_rx) = oneshot::channel();
        let start_worker = {
            let mut state = self.inner.lock_state();
            tracing::debug!(?request, priority = priority.0, queued = state.queue.len(), "enqueue request");
            state.queue.push(request, priority, response_tx);
            !std::mem::replace(&mut state.draining, true)
        };
        if start_worker {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.drain());
        }
        async move {
            match response_rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(DispatchError::WorkerGone),
            }
        }
    }

    /// Pending requests in dispatch order.
    pub fn pending(&self) -> Vec<(Priority, E::Request)> {
        self.inner
            .lock_state()
            .queue
            .snapshot()
            .into_iter()
            .map(|(priority, request)| (priority, request.clone()))
            .collect()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.lock_state().draining
    }
}

impl<E: RequestExecutor> Inner<E> {
    fn lock_state(&self) -> MutexGuard<'_, SchedulerState<E>> {
        // The state has no invariants that a panic mid-update could break.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn drain(self: Arc<Self>) {
        let mut guard = DrainGuard {
            inner: &self,
            armed: true,
        };
        loop {
            let (entry, last_dispatch) = {
                let mut state = self.lock_state();
                match state.queue.pop() {
                    Some(entry) => (entry, state.last_dispatch),
                    None => {
                        state.draining = false;
                        guard.armed = false;
                        return;
                    }
                }
            };

            if let Some(last) = last_dispatch {
                tokio::time::sleep_until(last + self.config.min_interval).await;
            }
            self.lock_state().last_dispatch = Some(Instant::now());

            tracing::debug!(request = ?entry.request, priority = entry.priority.0, "dispatch request");
            let outcome = self.execute_isolated(&entry.request).await;
            if entry.respond_to.send(outcome).is_err() {
                tracing::debug!(request = ?entry.request, "caller dropped before response");
            }
        }
    }

    /// Run one request in its own task so a panicking executor fails only
    /// that request.
    async fn execute_isolated(self: &Arc<Self>, request: &E::Request) -> Result<E::Response, DispatchError> {
        let worker = Arc::clone(self);
        let owned = request.clone();
        match tokio::spawn(async move { worker.execute_with_retry(&owned).await }).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(?request, error = %err, "request aborted");
                Err(DispatchError::Aborted(err.to_string()))
            }
        }
    }

    async fn execute_with_retry(&self, request: &E::Request) -> Result<E::Response, DispatchError> {
        let mut attempt: u32 = 0;
        loop {
            let error = match self.executor.execute(request).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            attempt += 1;

            match self.config.retry.decide(attempt, &error) {
                RetryDecision::Retry(delay) => {
                    tracing::error!(
                        ?request,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(?request, attempt, error = %error, "request failed, giving up");
                    return Err(if error.is_retryable() {
                        DispatchError::Exhausted {
                            attempts: attempt,
                            last: error,
                        }
                    } else {
                        DispatchError::Rejected(error)
                    });
                }
            }
        }
    }
}

/// Clears `draining` when the worker ends without emptying the queue
/// (panic or runtime shutdown), so the next submit restarts it.
struct DrainGuard<'a, E: RequestExecutor> {
    inner: &'a Inner<E>,
    armed: bool,
}

impl<E: RequestExecutor> Drop for DrainGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.lock_state().draining = false;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
