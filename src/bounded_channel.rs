// SPDX-License-Identifier: Apache-2.0

//! Bounded channel bridging the tail follower thread and async readers.
//!
//! The follower is a plain OS thread and sends with [`BoundedSender::send_blocking`];
//! readers await [`BoundedReceiver::next`]. A pending `next` that is dropped
//! before completing leaves the queued item in place.

use flume::{Receiver, Sender};
use std::fmt;

pub struct BoundedSender<T> {
    tx: Sender<T>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendError {
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Disconnected => write!(f, "channel disconnected"),
        }
    }
}

impl<T> BoundedSender<T> {
    /// Blocks the calling thread until there is capacity or the receiver is gone.
    pub fn send_blocking(&self, item: T) -> Result<(), SendError> {
        self.tx.send(item).map_err(|_| SendError::Disconnected)
    }

    pub fn is_disconnected(&self) -> bool {
        self.tx.is_disconnected()
    }
}

pub struct BoundedReceiver<T> {
    rx: Receiver<T>,
}

impl<T> BoundedReceiver<T> {
    /// Waits for the next item. Returns None once every sender is dropped and
    /// the queue is drained.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

pub fn bounded<T>(size: usize) -> (BoundedSender<T>, BoundedReceiver<T>) {
    let (tx, rx) = flume::bounded::<T>(size);
    (BoundedSender { tx }, BoundedReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::{SendError, bounded};
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task::spawn};

    #[tokio::test]
    async fn receives_from_blocking_sender() {
        let (tx, mut rx) = bounded(2);

        let handle = std::thread::spawn(move || {
            tx.send_blocking(1).unwrap();
            tx.send_blocking(2).unwrap();
            tx.send_blocking(3).unwrap();
        });

        assert_eq!(Some(1), rx.next().await);
        assert_eq!(Some(2), rx.next().await);
        assert_eq!(Some(3), rx.next().await);

        handle.join().unwrap();
        // all senders gone
        assert_eq!(None, rx.next().await);
    }

    #[tokio::test]
    async fn dropped_recv_does_not_consume() {
        let (tx, mut rx) = bounded::<u32>(1);

        {
            let mut recv1 = spawn(async { rx.next().await });
            assert_pending!(recv1.poll());
        }

        tx.send_blocking(7).unwrap();
        assert_eq!(rx.len(), 1);

        let mut recv2 = spawn(async { rx.next().await });
        assert_eq!(Some(7), assert_ready!(recv2.poll()));
    }

    #[test]
    fn blocked_sender_released_on_rx_drop() {
        let (tx, rx) = bounded(1);
        tx.send_blocking(1).unwrap();

        let handle = std::thread::spawn(move || tx.send_blocking(2));

        std::thread::sleep(Duration::from_millis(50));
        drop(rx);

        assert_eq!(Err(SendError::Disconnected), handle.join().unwrap());
    }
}
