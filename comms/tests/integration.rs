use std::{num::NonZeroUsize, time::Duration};

use comms::{ChannelClosed, WaitSet};
use tokio::time;

fn cap(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[tokio::test]
async fn send_recv_both_directions() {
    let (mut left, mut right) = comms::duplex::<String, u32>(cap(4));

    left.send("Hello, world!".to_string()).await.unwrap();
    right.send(42).await.unwrap();

    assert_eq!(right.recv().await.unwrap(), "Hello, world!");
    assert_eq!(left.recv().await.unwrap(), 42);
}

#[tokio::test]
async fn dropping_peer_closes_channel() {
    let (mut left, right) = comms::duplex::<u8, u8>(cap(1));
    right.send(7).await.unwrap();
    drop(right);

    // Queued messages are still delivered before the closure shows up.
    assert_eq!(left.recv().await, Ok(7));
    assert_eq!(left.recv().await, Err(ChannelClosed));
    assert_eq!(left.send(1).await, Err(ChannelClosed));
}

#[tokio::test]
async fn try_recv_does_not_block() {
    let (mut left, right) = comms::duplex::<(), u8>(cap(1));
    assert_eq!(left.try_recv(), Ok(None));

    right.send(3).await.unwrap();
    assert_eq!(left.try_recv(), Ok(Some(3)));
}

#[tokio::test]
async fn wait_set_yields_in_arrival_order_and_drains() {
    let (mut a, a_peer) = comms::duplex::<(), &'static str>(cap(1));
    let (mut b, b_peer) = comms::duplex::<(), &'static str>(cap(1));
    let (mut c, c_peer) = comms::duplex::<(), &'static str>(cap(1));

    tokio::spawn(async move {
        time::sleep(Duration::from_millis(30)).await;
        a_peer.send("a").await.unwrap();
    });
    tokio::spawn(async move {
        c_peer.send("c").await.unwrap();
    });
    tokio::spawn(async move {
        time::sleep(Duration::from_millis(10)).await;
        b_peer.send("b").await.unwrap();
    });

    let mut set: WaitSet<'_, usize, &str> = [
        (0, a.receiver_mut()),
        (1, b.receiver_mut()),
        (2, c.receiver_mut()),
    ]
    .into_iter()
    .collect();

    let mut order = Vec::new();
    while let Some((key, msg)) = set.next().await {
        order.push((key, msg.unwrap()));
    }

    assert_eq!(order, vec![(2, "c"), (1, "b"), (0, "a")]);
    assert!(set.is_empty());
}

#[tokio::test]
async fn wait_set_reports_closed_receivers() {
    let (mut a, a_peer) = comms::duplex::<(), u8>(cap(1));
    drop(a_peer);

    let mut set = WaitSet::new();
    set.insert("a", a.receiver_mut());

    assert_eq!(set.next().await, Some(("a", Err(ChannelClosed))));
    assert_eq!(set.next().await, None);
}
