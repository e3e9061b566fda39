//! Fixed-interval polling with cancellation on drop.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ---

/// Handle to a running poller. Dropping it stops the polling task.
#[derive(Debug)]
pub struct PollHandle {
    // ---
    name: &'static str,
    task: JoinHandle<()>,
}

impl PollHandle {
    // ---
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        tracing::debug!(poller = self.name, "Stopping poller");
        self.task.abort();
    }
}

/// Run `tick` immediately and then every `every`, until the handle is dropped.
///
/// A slow tick delays the next one rather than bursting to catch up. Failures
/// are the tick's business; the poller just keeps going.
pub fn spawn_poller<F, Fut>(name: &'static str, every: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    // ---
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            tracing::debug!(poller = name, "Poll tick");
            tick().await;
        }
    });

    tracing::info!(poller = name, "Polling every {}s", every.as_secs());
    PollHandle { name, task }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_on_interval() {
        // ---
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = spawn_poller("test", Duration::from_secs(60), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
