use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use groundlink_frame::{Action, Reply};
use groundlink_transport::{LinkTransport, TcpTransport};
use tracing::{info, warn};

use crate::assemble::AssembleWorker;
use crate::config::LinkConfig;
use crate::decode::{DecodeWorker, ReplyHandler};
use crate::error::{LinkError, Result};
use crate::heartbeat::HeartbeatWorker;
use crate::queue::FrameQueue;
use crate::receiver::{Inbound, ReceiveWorker};
use crate::sender::SendWorker;
use crate::worker::WorkerHandle;

/// Cloneable handle for queueing outbound frames from any thread.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    queue: Arc<FrameQueue>,
}

impl OutboundSender {
    /// Queue a frame for sending. Returns false once the link is stopped.
    pub fn push(&self, frame: Bytes) -> bool {
        self.queue.push(frame)
    }
}

/// A live connection to one vehicle.
///
/// Owns the transport and four worker threads (plus an optional heartbeat)
/// joined by three queues:
///
/// ```text
///  push_outbound ─▶ [outbound] ─▶ send ─▶ transport
///  transport ─▶ receive ─▶ [raw] ─▶ assemble ─▶ [complete] ─▶ decode ─▶ on_reply
/// ```
///
/// Frames pushed before [`start`](Link::start) wait in the outbound queue.
/// A stopped link stays stopped; build a new one to reconnect from scratch.
pub struct Link<T: LinkTransport = TcpTransport> {
    config: LinkConfig,
    transport: Arc<T>,
    outbound: Arc<FrameQueue>,
    on_reply: Option<ReplyHandler>,
    workers: Vec<WorkerHandle>,
    running: bool,
}

impl Link<TcpTransport> {
    /// Validate `config` and connect over TCP, retrying per the config.
    pub fn connect<F>(config: LinkConfig, on_reply: F) -> Result<Self>
    where
        F: FnMut(Reply<'_>) + Send + 'static,
    {
        Self::with_transport(config, Arc::new(TcpTransport::new()), on_reply)
    }
}

impl<T: LinkTransport> Link<T> {
    /// Validate `config` and connect `transport`, retrying per the config.
    pub fn with_transport<F>(config: LinkConfig, transport: Arc<T>, on_reply: F) -> Result<Self>
    where
        F: FnMut(Reply<'_>) + Send + 'static,
    {
        config.validate()?;
        connect_with_retry(transport.as_ref(), &config)?;
        Ok(Self {
            config,
            transport,
            outbound: Arc::new(FrameQueue::new("outbound")),
            on_reply: Some(Box::new(on_reply)),
            workers: Vec::new(),
            running: false,
        })
    }

    /// Spawn the pipeline workers.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(LinkError::AlreadyRunning);
        }
        let on_reply = self.on_reply.take().ok_or(LinkError::Stopped)?;

        let raw = Arc::new(FrameQueue::<Inbound>::new("raw"));
        let complete = Arc::new(FrameQueue::new("complete"));
        self.running = true;

        if let Err(err) = self.spawn_workers(raw, complete, on_reply) {
            self.stop();
            return Err(err);
        }
        info!(endpoint = %self.config.server.endpoint(), workers = self.workers.len(), "link started");
        Ok(())
    }

    fn spawn_workers(
        &mut self,
        raw: Arc<FrameQueue<Inbound>>,
        complete: Arc<FrameQueue>,
        on_reply: ReplyHandler,
    ) -> Result<()> {
        let config = &self.config;
        self.workers.push(WorkerHandle::spawn(DecodeWorker::new(
            Arc::clone(&complete),
            config.max_payload,
            on_reply,
        ))?);
        self.workers.push(WorkerHandle::spawn(AssembleWorker::new(
            Arc::clone(&raw),
            complete,
            config.policy,
        ))?);
        self.workers.push(WorkerHandle::spawn(
            ReceiveWorker::new(Arc::clone(&self.transport), raw, config.server.endpoint())
                .with_buffer_size(config.receive_buffer_size)
                .with_backoff(config.reconnect_backoff, config.receive_error_backoff),
        )?);
        self.workers.push(WorkerHandle::spawn(SendWorker::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.outbound),
        ))?);
        if let Some(interval) = config.heartbeat_interval {
            self.workers.push(WorkerHandle::spawn(HeartbeatWorker::new(
                Arc::clone(&self.outbound),
                interval,
            ))?);
        }
        Ok(())
    }

    /// Queue an already-built frame. Returns false once the link is stopped.
    pub fn push_outbound(&self, frame: Bytes) -> bool {
        self.outbound.push(frame)
    }

    /// Frame `action` for the configured device and queue it.
    pub fn send_action(&self, action: &Action) -> bool {
        self.push_outbound(action.to_frame(&self.config.serial))
    }

    /// A handle other threads can push frames through.
    pub fn sender(&self) -> OutboundSender {
        OutboundSender {
            queue: Arc::clone(&self.outbound),
        }
    }

    /// Stop every worker and wait for them to exit. Idempotent.
    ///
    /// Closing the transport releases a blocked receive; each worker's
    /// waker closes the queue it waits on.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.transport.close();
        for worker in &self.workers {
            worker.request_stop();
        }
        // Frames pushed before start are still refused once stopped.
        self.outbound.close();
        for mut worker in self.workers.drain(..) {
            worker.join();
        }
        info!("link stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Frames waiting to be sent.
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }
}

impl<T: LinkTransport> Drop for Link<T> {
    fn drop(&mut self) {
        self.stop();
        self.transport.close();
    }
}

impl<T: LinkTransport> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("endpoint", &self.config.server.endpoint())
            .field("running", &self.running)
            .field("workers", &self.workers)
            .field("pending_outbound", &self.outbound.len())
            .finish()
    }
}

/// Connect once per `connect_backoff` until it works or the attempt budget
/// runs out.
fn connect_with_retry<T: LinkTransport>(transport: &T, config: &LinkConfig) -> Result<()> {
    let endpoint = config.server.endpoint();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match transport.connect(&endpoint) {
            Ok(()) => return Ok(()),
            Err(err) if err.is_shutdown() => return Err(err.into()),
            Err(err) => {
                if config.max_connect_attempts.is_some_and(|max| attempts >= max) {
                    warn!(%endpoint, attempts, %err, "giving up on connect");
                    return Err(LinkError::ConnectAttemptsExhausted { endpoint, attempts });
                }
                warn!(%endpoint, attempts, %err, backoff = ?config.connect_backoff, "connect failed, retrying");
                thread::sleep(config.connect_backoff);
            }
        }
    }
}
