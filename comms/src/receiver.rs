//! The receiving half of an in-process channel.

use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::ChannelClosed;

/// The receiving end handle of the communication.
#[derive(Debug)]
pub struct Receiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Receiver<T> {
    /// Creates a new `Receiver` instance.
    ///
    /// # Arguments
    /// * `rx` - The underlying queue receiver.
    pub(super) fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Waits to receive a new message from the peer.
    ///
    /// # Returns
    /// The next message, or `ChannelClosed` once every sender is gone and the
    /// queue has been drained.
    pub async fn recv(&mut self) -> Result<T, ChannelClosed> {
        self.rx.recv().await.ok_or(ChannelClosed)
    }

    /// Takes a message if one is already queued, without waiting.
    ///
    /// # Returns
    /// `Ok(None)` when the queue is momentarily empty.
    pub fn try_recv(&mut self) -> Result<Option<T>, ChannelClosed> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelClosed),
        }
    }

    /// Stops accepting new messages. Already queued ones can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
