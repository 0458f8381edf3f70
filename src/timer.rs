//! Cooking-step countdown.
//!
//! Only one countdown runs at a time. Starting a new one, calling [`StepTimer::stop`]
//! or dropping the timer aborts the running task and silences the sink, so no tick
//! can fire after the user has moved on.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_secs(1);

/// Side effects of a running countdown: tick sounds, spoken prompts and so on.
pub trait TimerSink: Send + Sync {
    /// Called once before a countdown starts, e.g. to initialise audio.
    fn prepare(&self) {}

    fn tick(&self, remaining_secs: u64);

    fn finished(&self) {}

    /// Silence everything the sink may still be playing.
    fn stop_all(&self);
}

pub struct StepTimer {
    sink: Arc<dyn TimerSink>,
    task: Option<JoinHandle<()>>,
    remaining: watch::Receiver<u64>,
}

impl StepTimer {
    pub fn new(sink: Arc<dyn TimerSink>) -> Self {
        let (_, remaining) = watch::channel(0);
        Self {
            sink,
            task: None,
            remaining,
        }
    }

    pub fn start_minutes(&mut self, minutes: u32) {
        self.start(Duration::from_secs(u64::from(minutes) * 60));
    }

    /// Starts a countdown, replacing any countdown already running.
    pub fn start(&mut self, duration: Duration) {
        self.stop();

        let total = duration.as_secs();
        let (tx, rx) = watch::channel(total);
        self.remaining = rx;
        self.sink.prepare();
        tracing::debug!(seconds = total, "step timer started");

        let sink = Arc::clone(&self.sink);
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            // The first tick completes immediately.
            interval.tick().await;
            let mut left = total;
            loop {
                interval.tick().await;
                if left <= 1 {
                    let _ = tx.send(0);
                    sink.stop_all();
                    sink.finished();
                    break;
                }
                left -= 1;
                let _ = tx.send(left);
                sink.tick(left);
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                task.abort();
                self.sink.stop_all();
                tracing::debug!("step timer cancelled");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_secs(*self.remaining.borrow())
    }

    /// Waits for the running countdown to run out.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
        }
        self.task = None;
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
