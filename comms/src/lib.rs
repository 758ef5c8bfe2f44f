mod error;
mod receiver;
mod sender;
mod wait;

use std::num::NonZeroUsize;

use tokio::sync::mpsc;

pub use error::ChannelClosed;
pub use receiver::Receiver;
pub use sender::Sender;
pub use wait::WaitSet;

/// One side of a duplex channel: sends `S` to the peer and receives `R` from it.
#[derive(Debug)]
pub struct Endpoint<S, R> {
    tx: Sender<S>,
    rx: Receiver<R>,
}

impl<S, R> Endpoint<S, R> {
    /// Sends `msg` to the peer endpoint.
    ///
    /// # Returns
    /// `ChannelClosed` if the peer endpoint was dropped.
    pub async fn send(&self, msg: S) -> Result<(), ChannelClosed> {
        self.tx.send(msg).await
    }

    /// Waits for the next message from the peer endpoint.
    ///
    /// # Returns
    /// `ChannelClosed` once the peer endpoint was dropped and nothing is left queued.
    pub async fn recv(&mut self) -> Result<R, ChannelClosed> {
        self.rx.recv().await
    }

    /// Takes an already queued message without waiting.
    pub fn try_recv(&mut self) -> Result<Option<R>, ChannelClosed> {
        self.rx.try_recv()
    }

    /// Gives access to the receiving half, e.g. to register it in a `WaitSet`.
    pub fn receiver_mut(&mut self) -> &mut Receiver<R> {
        &mut self.rx
    }

    /// Stops receiving, the peer will see its sends fail from now on.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Creates both ends of a duplex, message-oriented channel.
///
/// The two endpoints are created together and share nothing but the queues
/// between them, each of them holding at most `capacity` undelivered messages.
///
/// # Arguments
/// * `capacity` - The bound of each direction's queue.
///
/// # Returns
/// The first endpoint sends `A` and receives `B`, the second one the opposite.
pub fn duplex<A, B>(capacity: NonZeroUsize) -> (Endpoint<A, B>, Endpoint<B, A>) {
    let (a_tx, a_rx) = mpsc::channel(capacity.get());
    let (b_tx, b_rx) = mpsc::channel(capacity.get());

    let first = Endpoint {
        tx: Sender::new(a_tx),
        rx: Receiver::new(b_rx),
    };
    let second = Endpoint {
        tx: Sender::new(b_tx),
        rx: Receiver::new(a_rx),
    };

    (first, second)
}
