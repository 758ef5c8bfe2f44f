//! Waiting on many receivers at once.

use futures::{
    StreamExt,
    future::BoxFuture,
    stream::FuturesUnordered,
};

use crate::{ChannelClosed, Receiver};

type Pending<'a, K, T> = BoxFuture<'a, (K, Result<T, ChannelClosed>)>;

/// A set of keyed receivers that is waited on as a whole.
///
/// Every receiver inserted yields exactly one message (or its closure) and is
/// then dropped from the set, so the set drains to empty after one message per
/// key. Messages come out in arrival order, not insertion order.
pub struct WaitSet<'a, K, T> {
    pending: FuturesUnordered<Pending<'a, K, T>>,
}

impl<'a, K, T> WaitSet<'a, K, T>
where
    K: Send + 'a,
    T: Send + 'a,
{
    /// Creates an empty `WaitSet`.
    pub fn new() -> Self {
        Self {
            pending: FuturesUnordered::new(),
        }
    }

    /// Adds a receiver to the set, tagged with `key`.
    ///
    /// # Arguments
    /// * `key` - Identifies the receiver in the yielded items.
    /// * `rx` - The receiver to wait on, borrowed until it yields.
    pub fn insert(&mut self, key: K, rx: &'a mut Receiver<T>) {
        self.pending.push(Box::pin(async move {
            let msg = rx.recv().await;
            (key, msg)
        }));
    }

    /// The amount of receivers that have not yielded yet.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Waits until any remaining receiver is ready and removes it from the set.
    ///
    /// # Returns
    /// The key and outcome of the first ready receiver, or `None` if the set is empty.
    pub async fn next(&mut self) -> Option<(K, Result<T, ChannelClosed>)> {
        self.pending.next().await
    }
}

impl<'a, K, T> Default for WaitSet<'a, K, T>
where
    K: Send + 'a,
    T: Send + 'a,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, T> FromIterator<(K, &'a mut Receiver<T>)> for WaitSet<'a, K, T>
where
    K: Send + 'a,
    T: Send + 'a,
{
    fn from_iter<I: IntoIterator<Item = (K, &'a mut Receiver<T>)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, rx) in iter {
            set.insert(key, rx);
        }
        set
    }
}
