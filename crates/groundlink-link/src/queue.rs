use bytes::Bytes;
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use tracing::trace;

use crate::worker::Signal;

/// Unbounded FIFO handed between two pipeline stages.
///
/// Any number of producers may push; one consumer blocks in [`pop`] until an
/// item arrives or the queue is closed. Closing wakes every waiter, and a
/// closed queue yields nothing further even if items remain.
///
/// [`pop`]: FrameQueue::pop
#[derive(Debug)]
pub struct FrameQueue<T = Bytes> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
    closed: Signal,
}

impl<T> FrameQueue<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = unbounded();
        Self {
            name,
            tx,
            rx,
            closed: Signal::new(),
        }
    }

    /// Append an item. Returns false if the queue is closed and the item
    /// was dropped.
    pub fn push(&self, item: T) -> bool {
        if self.closed.is_fired() {
            trace!(queue = self.name, "push on closed queue");
            return false;
        }
        // The queue owns a receiver, so the channel never disconnects.
        self.tx.send(item).is_ok()
    }

    /// Block until an item is available or the queue is closed.
    pub fn pop(&self) -> Option<T> {
        if self.closed.is_fired() {
            return None;
        }
        select! {
            recv(self.rx) -> item => item.ok().filter(|_| !self.closed.is_fired()),
            recv(self.closed.receiver()) -> _ => None,
        }
    }

    /// Take the head item without blocking.
    pub fn try_pop(&self) -> Option<T> {
        if self.closed.is_fired() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Close the queue, drop anything pending and wake all waiters.
    /// Idempotent.
    pub fn close(&self) {
        if self.closed.fire() {
            let pending = self.rx.try_iter().count();
            trace!(queue = self.name, pending, "queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_fired()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn fifo_order() {
        let queue = FrameQueue::<Bytes>::new("test");
        for i in 0..5u8 {
            assert!(queue.push(Bytes::from(vec![i])));
        }
        assert_eq!(queue.len(), 5);
        for i in 0..5u8 {
            assert_eq!(queue.pop().unwrap().as_ref(), &[i]);
        }
        assert!(queue.is_empty());
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn pop_blocks_until_push() {
        let queue = Arc::new(FrameQueue::<Bytes>::new("test"));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(30));
        queue.push(Bytes::from_static(b"late"));
        assert_eq!(consumer.join().unwrap().unwrap().as_ref(), b"late");
    }

    #[test]
    fn close_wakes_blocked_consumer() {
        let queue = Arc::new(FrameQueue::<Bytes>::new("test"));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(30));
        queue.close();
        assert!(consumer.join().unwrap().is_none());
    }

    #[test]
    fn closed_queue_rejects_and_yields_nothing() {
        let queue = FrameQueue::<Bytes>::new("test");
        queue.push(Bytes::from_static(b"pending"));
        queue.close();
        queue.close();

        assert!(queue.is_closed());
        assert!(!queue.push(Bytes::from_static(b"dropped")));
        assert!(queue.pop().is_none());
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let queue = Arc::new(FrameQueue::<Bytes>::new("test"));
        let producers: Vec<_> = (0..4u8)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..25u8 {
                        queue.push(Bytes::from(vec![p, i]));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut next = [0u8; 4];
        let mut count = 0;
        while let Some(frame) = queue.try_pop() {
            let (p, i) = (frame[0] as usize, frame[1]);
            assert_eq!(i, next[p], "producer {p} out of order");
            next[p] += 1;
            count += 1;
        }
        assert_eq!(count, 100);
    }

    #[test]
    fn close_discards_pending_items() {
        let queue = FrameQueue::<Bytes>::new("test");
        queue.push(Bytes::from_static(b"one"));
        queue.push(Bytes::from_static(b"two"));
        assert_eq!(queue.len(), 2);

        queue.close();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
    }
}
