//! Named repeating tasks with explicit start/stop lifecycle.
//!
//! Owned object rather than module-level timer handles: injectable, testable
//! with a paused clock, and multiple independent instances can coexist.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Runs named callbacks on fixed intervals until explicitly stopped.
///
/// At most one live task per name; `start` is idempotent so repeated
/// mount/unmount or toggling a monitoring flag cannot stack intervals.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a named repeating task. The first tick fires immediately.
    ///
    /// Returns false (and changes nothing) if a live task with that name is
    /// already running. Each tick runs in its own detached task: a tick
    /// that panics is logged and the schedule continues, and a tick that
    /// hangs does not delay the next one. The cadence re-issues regardless
    /// of whether the previous tick has resolved.
    pub fn start<F, Fut>(&self, name: &str, interval: Duration, task: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(handle) = tasks.get(name) {
            if !handle.is_finished() {
                debug!("Timer '{}' already running, start is a no-op", name);
                return false;
            }
        }

        let task = Arc::new(task);
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = tokio::spawn(task());
                let name = task_name.clone();
                tokio::spawn(async move {
                    if let Err(e) = tick.await {
                        error!("Timer '{}' tick panicked: {}", name, e);
                    }
                });
            }
        });

        tasks.insert(name.to_string(), handle);
        debug!("Timer '{}' started with interval {:?}", name, interval);
        true
    }

    /// Cancel the named task if present; safe to call when not running.
    pub fn stop(&self, name: &str) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.remove(name) {
            Some(handle) => {
                handle.abort();
                debug!("Timer '{}' stopped", name);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        let tasks = self.tasks.lock().unwrap();
        tasks.get(name).map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop every task.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for (name, handle) in tasks.drain() {
            handle.abort();
            debug!("Timer '{}' stopped", name);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
