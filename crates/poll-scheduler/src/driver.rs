//! Periodic tick driver

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// A background task that runs a tick body on a fixed period.
///
/// The first tick fires immediately. A tick body always runs to completion
/// before the next one starts; ticks missed while a body was running are
/// not replayed.
pub struct PeriodicTask {
    name: String,
    trigger: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn the task on the current tokio runtime
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let (shutdown, mut stop_rx) = watch::channel(false);
        let trigger = Arc::new(Notify::new());
        let notified = Arc::clone(&trigger);
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("{} started (period: {:?})", task_name, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = notified.notified() => {
                        debug!("{} immediate tick requested", task_name);
                    }
                    _ = stop_rx.changed() => break,
                }
                tick().await;
            }

            info!("{} stopped", task_name);
        });

        Self {
            name,
            trigger,
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a tick as soon as the current one (if any) finishes
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Stop after the running tick (if any) completes, and wait for the task
    pub async fn stop(self) {
        info!("Stopping {}", self.name);
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("{} exited abnormally: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::{timeout, Instant};

    fn counting_task(period: Duration) -> (PeriodicTask, mpsc::UnboundedReceiver<Instant>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = PeriodicTask::spawn("test task", period, move || {
            let tx = tx.clone();
            async move {
                let _ = tx.send(Instant::now());
            }
        });
        (task, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_period() {
        let (task, mut rx) = counting_task(Duration::from_secs(60));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        let third = rx.recv().await.unwrap();

        assert_eq!(second - first, Duration::from_secs(60));
        assert_eq!(third - second, Duration::from_secs(60));
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_runs_tick_immediately() {
        let (task, mut rx) = counting_task(Duration::from_secs(3600));
        rx.recv().await.unwrap();

        task.trigger();
        let triggered = timeout(Duration::from_secs(1), rx.recv()).await;

        assert!(triggered.is_ok());
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_ticking() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = PeriodicTask::spawn("stopping task", Duration::from_secs(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(25)).await;
        task.stop().await;
        let stopped_at = count.load(Ordering::SeqCst);
        assert!(stopped_at >= 1);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_do_not_overlap() {
        let running = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (r, o) = (Arc::clone(&running), Arc::clone(&overlaps));

        let task = PeriodicTask::spawn("slow task", Duration::from_secs(1), move || {
            let (running, overlaps, tx) = (Arc::clone(&r), Arc::clone(&o), tx.clone());
            async move {
                if running.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                let _ = tx.send(());
            }
        });

        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        task.stop().await;
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
