//! Clock and one-shot timer capability consumed by the engine.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation handle for a scheduled callback.
///
/// Dropping the handle does not cancel the timer.
pub trait TimerHandle: Send + Sync {
    fn cancel(&self);
}

/// Runs callbacks after a delay.
///
/// Implementations must never invoke the callback from inside `after`; the
/// engine registers the returned handle before the callback may run.
pub trait Scheduler: Send + Sync {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn after(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle>;
}

/// Scheduler backed by tokio tasks: one sleeping task per timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Use the runtime of the calling context. Panics outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

struct TokioTimer(AbortHandle);

impl TimerHandle for TokioTimer {
    fn cancel(&self) {
        self.0.abort();
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Box::new(TokioTimer(task.abort_handle()))
    }
}
