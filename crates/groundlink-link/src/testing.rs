//! In-memory transport for worker unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use bytes::Bytes;
use groundlink_transport::{Endpoint, LinkTransport, Result, TransportError};

/// One scripted outcome of `receive`.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Data(Vec<u8>),
    PeerClosed,
    Fail,
}

/// Replays scripted receive results, records sends, and blocks in
/// `receive` once the script runs dry until `close` is called.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    more: Condvar,
    sent: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
    connects: AtomicUsize,
    failing_connects: AtomicUsize,
    failing_sends: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let transport = Self::default();
        transport.steps.lock().unwrap().extend(steps);
        transport
    }

    pub(crate) fn script(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
        self.more.notify_all();
    }

    pub(crate) fn fail_next_connects(&self, n: usize) {
        self.failing_connects.store(n, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_sends(&self, n: usize) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl LinkTransport for ScriptedTransport {
    fn connect(&self, endpoint: &Endpoint) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.failing_connects) {
            return Err(TransportError::Connect {
                endpoint: endpoint.clone(),
                source: std::io::ErrorKind::ConnectionRefused.into(),
            });
        }
        Ok(())
    }

    fn send(&self, bytes: &[u8]) -> Result<usize> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }
        if Self::take_failure(&self.failing_sends) {
            return Err(TransportError::Io(std::io::ErrorKind::BrokenPipe.into()));
        }
        self.sent.lock().unwrap().push(Bytes::copy_from_slice(bytes));
        Ok(bytes.len())
    }

    fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let mut steps = self.steps.lock().unwrap();
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Shutdown);
            }
            match steps.pop_front() {
                Some(Step::Data(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        steps.push_front(Step::Data(data[n..].to_vec()));
                    }
                    return Ok(n);
                }
                Some(Step::PeerClosed) => return Ok(0),
                Some(Step::Fail) => {
                    return Err(TransportError::Io(std::io::ErrorKind::TimedOut.into()))
                }
                None => steps = self.more.wait(steps).unwrap(),
            }
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _steps = self.steps.lock().unwrap();
        self.more.notify_all();
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}
