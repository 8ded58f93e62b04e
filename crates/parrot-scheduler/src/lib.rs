//! Single-lane outbound request scheduler: priority ordering, a minimum
//! spacing between dispatches, and retry on rate-limit or transient failure.

mod queue;
mod retry;
mod scheduler;

pub use queue::Priority;
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::{DispatchError, RequestExecutor, RequestScheduler, SchedulerConfig};
