use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// A tokio task that runs `tick` every `period` until it returns
/// `ControlFlow::Break`, or until the handle is stopped or dropped.
///
/// Ticks never overlap: the next one starts only after the previous future
/// has resolved. Late ticks are delayed, not bunched.
pub struct RepeatingTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> RepeatingTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if tick().await.is_break() {
                    debug!("Task {name} finished");
                    break;
                }
            }
        });

        RepeatingTask {
            name,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the task. An in-flight tick is cancelled at its next await.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Task {} stopped", self.name);
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(count: &Arc<AtomicUsize>, until: usize) -> RepeatingTask {
        let count = count.clone();
        RepeatingTask::start("count", Duration::from_millis(10), move || {
            let n = count.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n >= until {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_break() {
        let count = Arc::new(AtomicUsize::new(0));
        let task = counting(&count, 3);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut task = counting(&count, usize::MAX);

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(task.is_running());
        task.stop();
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 2, "{seen} ticks");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
        assert!(!task.is_running());
    }
}
