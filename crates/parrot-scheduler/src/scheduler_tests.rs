use super::*;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

const INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug, PartialEq, Eq)]
struct Job(&'static str);

#[derive(Default)]
struct ScriptedExecutor {
    scripts: Mutex<HashMap<&'static str, VecDeque<Result<(), RequestError>>>>,
    starts: Mutex<Vec<(&'static str, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    work: Duration,
}

impl ScriptedExecutor {
    fn with_work(work: Duration) -> Self {
        Self {
            work,
            ..Self::default()
        }
    }

    fn script(self, label: &'static str, outcomes: Vec<Result<(), RequestError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(label, outcomes.into_iter().collect());
        self
    }

    fn starts(&self) -> Vec<(&'static str, Instant)> {
        self.starts.lock().unwrap().clone()
    }

    fn order(&self) -> Vec<&'static str> {
        self.starts().into_iter().map(|(label, _)| label).collect()
    }

    fn calls(&self, label: &str) -> usize {
        self.starts().iter().filter(|(l, _)| *l == label).count()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    type Request = Job;
    type Response = &'static str;

    async fn execute(&self, request: &Job) -> Result<&'static str, RequestError> {
        self.starts.lock().unwrap().push((request.0, Instant::now()));
        if request.0 == "panic" {
            panic!("executor crashed on {request:?}");
        }
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(request.0)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(()));
        outcome.map(|()| request.0)
    }
}

fn scheduler(executor: ScriptedExecutor) -> RequestScheduler<ScriptedExecutor> {
    RequestScheduler::new(
        executor,
        SchedulerConfig {
            min_interval: INTERVAL,
            retry: RetryPolicy::default(),
        },
    )
}

fn assert_spaced(starts: &[(&'static str, Instant)], min: Duration) {
    for pair in starts.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(
            gap >= min,
            "dispatch of {} started {:?} after {}, expected >= {:?}",
            pair[1].0,
            gap,
            pair[0].0,
            min
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_send_priority_beats_query_regardless_of_order() {
    let scheduler = scheduler(ScriptedExecutor::default());
    let query = scheduler.submit(Job("query"), Priority::QUERY);
    let send = scheduler.submit(Job("send"), Priority::SEND);

    assert_eq!(send.await, Ok("send"));
    assert_eq!(query.await, Ok("query"));
    assert_eq!(scheduler.executor().order(), vec!["send", "query"]);
}

#[tokio::test(start_paused = true)]
async fn test_sends_then_typing_each_spaced_by_interval() {
    let scheduler = scheduler(ScriptedExecutor::default());
    let typing = scheduler.submit(Job("typing"), Priority::TYPING);
    let s1 = scheduler.submit(Job("s1"), Priority::SEND);
    let s2 = scheduler.submit(Job("s2"), Priority::SEND);
    let s3 = scheduler.submit(Job("s3"), Priority::SEND);

    let results = tokio::join!(typing, s1, s2, s3);
    assert_eq!(results, (Ok("typing"), Ok("s1"), Ok("s2"), Ok("s3")));

    let executor = scheduler.executor();
    assert_eq!(executor.order(), vec!["s1", "s2", "s3", "typing"]);
    assert_spaced(&executor.starts(), INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_pending_snapshot_before_worker_runs() {
    let scheduler = scheduler(ScriptedExecutor::default());
    let a = scheduler.submit(Job("fetch"), Priority::QUERY);
    let b = scheduler.submit(Job("typing"), Priority::TYPING);
    let c = scheduler.submit(Job("send"), Priority::SEND);

    let pending: Vec<Job> = scheduler.pending().into_iter().map(|(_, job)| job).collect();
    assert_eq!(pending, vec![Job("send"), Job("typing"), Job("fetch")]);
    assert!(scheduler.is_draining());

    let _ = tokio::join!(a, b, c);
    assert!(scheduler.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_burst_never_violates_interval_or_overlaps() {
    let scheduler = scheduler(ScriptedExecutor::with_work(Duration::from_millis(300)));
    let labels = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let futures: Vec<_> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| scheduler.submit(Job(*label), Priority((i % 3) as i32)))
        .collect();
    for future in futures {
        assert!(future.await.is_ok());
    }

    let executor = scheduler.executor();
    assert_eq!(executor.starts().len(), labels.len());
    assert_spaced(&executor.starts(), INTERVAL);
    assert_eq!(executor.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_serialize() {
    let scheduler = scheduler(ScriptedExecutor::with_work(Duration::from_millis(1500)));
    let mut handles = Vec::new();
    for label in ["x", "y", "z"] {
        let scheduler = scheduler.clone();
        handles.push(tokio::spawn(async move {
            scheduler.submit(Job(label), Priority::SEND).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    let executor = scheduler.executor();
    assert_eq!(executor.max_in_flight.load(Ordering::SeqCst), 1);
    assert_spaced(&executor.starts(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_idle_restart_still_respects_interval() {
    let scheduler = scheduler(ScriptedExecutor::default());
    assert_eq!(scheduler.submit(Job("first"), Priority::QUERY).await, Ok("first"));
    tokio::task::yield_now().await;
    assert!(!scheduler.is_draining());

    assert_eq!(scheduler.submit(Job("second"), Priority::QUERY).await, Ok("second"));
    assert_spaced(&scheduler.executor().starts(), INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_waits_server_hint_plus_margin() {
    let executor = ScriptedExecutor::default().script(
        "send",
        vec![Err(RequestError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        })],
    );
    let scheduler = scheduler(executor);
    let started = Instant::now();

    assert_eq!(scheduler.submit(Job("send"), Priority::SEND).await, Ok("send"));

    assert!(started.elapsed() >= Duration::from_millis(2250));
    assert_eq!(scheduler.executor().calls("send"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_without_hint_backs_off_exponentially() {
    let limited = || RequestError::RateLimited { retry_after: None };
    let executor = ScriptedExecutor::default().script("fetch", vec![Err(limited()), Err(limited())]);
    let scheduler = scheduler(executor);
    let started = Instant::now();

    assert_eq!(scheduler.submit(Job("fetch"), Priority::QUERY).await, Ok("fetch"));

    // 2s + 4s of backoff, each with the 250ms margin.
    assert!(started.elapsed() >= Duration::from_millis(6500));
    assert_eq!(scheduler.executor().calls("fetch"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_step_linearly() {
    let transient = || RequestError::Transient("connection reset".into());
    let executor =
        ScriptedExecutor::default().script("fetch", vec![Err(transient()), Err(transient())]);
    let scheduler = scheduler(executor);
    let started = Instant::now();

    assert_eq!(scheduler.submit(Job("fetch"), Priority::QUERY).await, Ok("fetch"));

    let starts = scheduler.executor().starts();
    assert_eq!(starts.len(), 3);
    assert!(starts[1].1 - starts[0].1 >= Duration::from_millis(500));
    assert!(starts[2].1 - starts[1].1 >= Duration::from_millis(1000));
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_last_error() {
    let transient = || Err(RequestError::Transient("503".into()));
    let executor = ScriptedExecutor::default().script("send", (0..10).map(|_| transient()).collect());
    let scheduler = scheduler(executor);

    let outcome = scheduler.submit(Job("send"), Priority::SEND).await;

    assert_eq!(
        outcome,
        Err(DispatchError::Exhausted {
            attempts: 6,
            last: RequestError::Transient("503".into()),
        })
    );
    assert_eq!(scheduler.executor().calls("send"), 6);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_is_not_retried() {
    let executor = ScriptedExecutor::default().script(
        "send",
        vec![Err(RequestError::Permanent("403 Forbidden".into()))],
    );
    let scheduler = scheduler(executor);

    let outcome = scheduler.submit(Job("send"), Priority::SEND).await;

    assert_eq!(
        outcome,
        Err(DispatchError::Rejected(RequestError::Permanent(
            "403 Forbidden".into()
        )))
    );
    assert_eq!(scheduler.executor().calls("send"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_isolated_to_its_caller() {
    let executor = ScriptedExecutor::default().script(
        "bad",
        vec![Err(RequestError::Permanent("404".into()))],
    );
    let scheduler = scheduler(executor);
    let bad = scheduler.submit(Job("bad"), Priority::SEND);
    let good = scheduler.submit(Job("good"), Priority::QUERY);

    assert!(bad.await.is_err());
    assert_eq!(good.await, Ok("good"));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_caller_does_not_stall_queue() {
    let scheduler = scheduler(ScriptedExecutor::default());
    drop(scheduler.submit(Job("abandoned"), Priority::SEND));
    assert_eq!(scheduler.submit(Job("kept"), Priority::QUERY).await, Ok("kept"));
    assert_eq!(scheduler.executor().order(), vec!["abandoned", "kept"]);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_executor_fails_only_its_request() {
    let scheduler = scheduler(ScriptedExecutor::default());
    let crashed = scheduler.submit(Job("panic"), Priority::SEND);
    let queued = scheduler.submit(Job("queued"), Priority::QUERY);

    assert!(matches!(crashed.await, Err(DispatchError::Aborted(_))));
    assert_eq!(queued.await, Ok("queued"));

    let later = scheduler.submit(Job("later"), Priority::QUERY).await;
    assert_eq!(later, Ok("later"));
    assert!(!scheduler.is_draining());
    assert_eq!(scheduler.executor().order(), vec!["panic", "queued", "later"]);
    assert_spaced(&scheduler.executor().starts(), INTERVAL);
}

#[test]
fn test_unwinding_worker_clears_draining_flag() {
    let scheduler = scheduler(ScriptedExecutor::default());
    scheduler.inner.lock_state().draining = true;

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = DrainGuard {
            inner: &*scheduler.inner,
            armed: true,
        };
        panic!("worker unwound");
    }));

    assert!(unwound.is_err());
    assert!(!scheduler.is_draining());
}

#[test]
fn test_disarmed_guard_leaves_flag_alone() {
    let scheduler = scheduler(ScriptedExecutor::default());
    scheduler.inner.lock_state().draining = true;
    drop(DrainGuard {
        inner: &*scheduler.inner,
        armed: false,
    });
    assert!(scheduler.is_draining());
}
