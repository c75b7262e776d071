//! Worker threads and their stop signalling.
//!
//! Every pipeline stage runs on its own named thread behind a
//! [`WorkerHandle`]. Stopping a worker flips its [`RunFlag`] and then calls
//! the worker's waker, which must release whatever blocking call the worker
//! may be parked in (a queue pop, a socket read). Sleeps taken through
//! [`RunFlag::sleep`] are released by the flag itself.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, warn};

use crate::error::{LinkError, Result};

/// One-shot broadcast built on channel disconnection.
///
/// Firing drops the only sender, so every current and future `recv` on
/// [`receiver`](Signal::receiver) returns at once.
#[derive(Debug)]
pub(crate) struct Signal {
    trigger: Mutex<Option<Sender<()>>>,
    fired: Receiver<()>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Mutex::new(Some(tx)),
            fired: rx,
        }
    }

    /// Fire the signal. Returns true only for the call that fired it.
    pub(crate) fn fire(&self) -> bool {
        let mut trigger = self.trigger.lock().unwrap_or_else(|p| p.into_inner());
        trigger.take().is_some()
    }

    pub(crate) fn is_fired(&self) -> bool {
        matches!(self.fired.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready (disconnected) once fired.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.fired
    }
}

/// Cooperative stop flag shared between a worker and its handle.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<Signal>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(Signal::new()))
    }

    pub fn is_running(&self) -> bool {
        !self.0.is_fired()
    }

    /// Clear the flag and wake any [`sleep`](RunFlag::sleep) in progress.
    pub fn stop(&self) {
        self.0.fire();
    }

    /// Sleep for `duration` unless stopped first.
    ///
    /// Returns whether the flag is still set afterwards.
    pub fn sleep(&self, duration: Duration) -> bool {
        matches!(
            self.0.receiver().recv_timeout(duration),
            Err(RecvTimeoutError::Timeout)
        )
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases a worker from its blocking wait.
pub type Waker = Box<dyn Fn() + Send + Sync>;

/// A pipeline stage that runs on its own thread.
pub trait Worker: Send + 'static {
    /// Thread-name suffix and log label.
    const NAME: &'static str;

    /// Build the closure that unblocks [`run`](Worker::run) on stop.
    fn waker(&self) -> Waker;

    /// Loop until `running` is cleared.
    fn run(self, running: RunFlag);
}

/// Owning handle to a spawned worker thread.
pub struct WorkerHandle {
    name: &'static str,
    running: RunFlag,
    waker: Waker,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn `worker` on a thread named `groundlink-<NAME>`.
    pub fn spawn<W: Worker>(worker: W) -> Result<Self> {
        let running = RunFlag::new();
        let waker = worker.waker();
        let flag = running.clone();
        let thread = thread::Builder::new()
            .name(format!("groundlink-{}", W::NAME))
            .spawn(move || {
                debug!(worker = W::NAME, "worker started");
                worker.run(flag);
                debug!(worker = W::NAME, "worker exited");
            })
            .map_err(|source| LinkError::Spawn {
                name: W::NAME,
                source,
            })?;

        Ok(Self {
            name: W::NAME,
            running,
            waker,
            thread: Some(thread),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the thread has returned.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Clear the run flag and release the worker's blocking wait.
    pub fn request_stop(&self) {
        self.running.stop();
        (self.waker)();
    }

    /// Wait for the thread to exit. Call [`request_stop`] first.
    ///
    /// [`request_stop`]: WorkerHandle::request_stop
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(worker = self.name, "worker panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.request_stop();
            self.join();
        }
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.name)
            .field("running", &self.running.is_running())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;

    struct Sleeper {
        ticks: Arc<AtomicUsize>,
    }

    impl Worker for Sleeper {
        const NAME: &'static str = "sleeper";

        fn waker(&self) -> Waker {
            Box::new(|| {})
        }

        fn run(self, running: RunFlag) {
            while running.sleep(Duration::from_secs(30)) {
                self.ticks.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn sleep_returns_early_on_stop() {
        let flag = RunFlag::new();
        let stopper = {
            let flag = flag.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                flag.stop();
            })
        };

        let started = Instant::now();
        assert!(!flag.sleep(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(5));
        stopper.join().unwrap();
    }

    #[test]
    fn signal_fires_once_and_releases_every_receiver() {
        let signal = Arc::new(Signal::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.receiver().recv().is_err())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.is_fired());
        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[test]
    fn sleep_after_stop_is_immediate() {
        let flag = RunFlag::new();
        flag.stop();
        assert!(!flag.sleep(Duration::from_secs(30)));
    }

    #[test]
    fn sleep_runs_full_duration_when_running() {
        let flag = RunFlag::new();
        let started = Instant::now();
        assert!(flag.sleep(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn handle_stops_sleeping_worker_promptly() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut handle = WorkerHandle::spawn(Sleeper {
            ticks: Arc::clone(&ticks),
        })
        .unwrap();
        assert_eq!(handle.name(), "sleeper");

        let started = Instant::now();
        handle.request_stop();
        handle.join();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(handle.is_finished());
        assert_eq!(ticks.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn drop_joins_worker() {
        let handle = WorkerHandle::spawn(Sleeper {
            ticks: Arc::new(AtomicUsize::new(0)),
        })
        .unwrap();
        drop(handle);
    }
}
