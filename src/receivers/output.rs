// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Duration;

/// Error returned when the consuming side of an output has gone away.
#[derive(Debug, PartialEq, Eq)]
pub enum OutputError {
    Closed,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Closed => write!(f, "event stream closed"),
        }
    }
}

impl std::error::Error for OutputError {}

/// Single-event append sink handed to receivers.
///
/// Backed by a bounded channel: `send` applies backpressure when the
/// consumer falls behind.
pub struct EventOutput<T> {
    tx: flume::Sender<T>,
}

impl<T> Clone for EventOutput<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> EventOutput<T> {
    pub async fn send(&self, event: T) -> Result<(), OutputError> {
        self.tx
            .send_async(event)
            .await
            .map_err(|_| OutputError::Closed)
    }

    /// Blocking append for non-async contexts.
    pub fn send_blocking(&self, event: T) -> Result<(), OutputError> {
        self.tx.send(event).map_err(|_| OutputError::Closed)
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consuming side of an event channel. Yields events in the order they
/// were appended; `next` returns `None` once every output clone is gone.
pub struct EventStream<T> {
    rx: flume::Receiver<T>,
}

impl<T> EventStream<T> {
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }

    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Blocking receive with timeout for sync consumers.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a bounded event channel of the given capacity.
pub fn event_channel<T>(capacity: usize) -> (EventOutput<T>, EventStream<T>) {
    let (tx, rx) = flume::bounded(capacity);
    (EventOutput { tx }, EventStream { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_ok, assert_pending, assert_ready, task::spawn};

    #[tokio::test]
    async fn test_send_recv_order() {
        let (output, mut stream) = event_channel(4);
        for i in 0..4 {
            output.send(i).await.unwrap();
        }
        for i in 0..4 {
            assert_eq!(stream.next().await, Some(i));
        }
    }

    #[tokio::test]
    async fn test_sender_blocks_when_full() {
        let (output, mut stream) = event_channel(1);

        assert_ok!(output.send(1).await);

        let mut send2 = spawn(output.send(2));
        assert_pending!(send2.poll());

        assert_eq!(stream.next().await, Some(1));
        assert_ok!(assert_ready!(send2.poll()));
    }

    #[tokio::test]
    async fn test_stream_ends_when_outputs_dropped() {
        let (output, mut stream) = event_channel(2);
        output.send("a").await.unwrap();
        drop(output);

        assert_eq!(stream.next().await, Some("a"));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_send_fails_when_stream_dropped() {
        let (output, stream) = event_channel::<u32>(1);
        drop(stream);
        assert_eq!(output.send(1).await, Err(OutputError::Closed));
        assert_eq!(output.send_blocking(2), Err(OutputError::Closed));
    }
}
