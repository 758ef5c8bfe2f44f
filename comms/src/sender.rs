//! The sending half of an in-process channel.

use tokio::sync::mpsc;

use crate::ChannelClosed;

/// The sending end handle of the communication.
#[derive(Debug)]
pub struct Sender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Sender<T> {
    /// Creates a new `Sender` instance.
    ///
    /// # Arguments
    /// * `tx` - The underlying queue sender.
    pub(super) fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }

    /// Enqueues `msg` for the peer, waiting only while the queue is full.
    ///
    /// # Arguments
    /// * `msg` - The message, ownership is transferred to the receiving side.
    ///
    /// # Returns
    /// `ChannelClosed` if the receiving half no longer exists.
    pub async fn send(&self, msg: T) -> Result<(), ChannelClosed> {
        self.tx.send(msg).await.map_err(|_| ChannelClosed)
    }
}
