mod common;

use bytes::Bytes;
use common::{Peer, init_tracing};
use mcs::session::{ClientConfig, McsClient, McsEvent, SessionState, Transport};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Transport backed by an unbounded channel to a peer task.
struct ChannelTransport {
    outbound: UnboundedSender<Bytes>,
}

impl Transport for ChannelTransport {
    fn write(&mut self, data: Bytes) {
        // a dropped peer shows up as a closed inbound channel
        let _ = self.outbound.send(data);
    }

    fn close(&mut self) {}
}

async fn serve(
    peer: Peer,
    mut inbound: UnboundedReceiver<Bytes>,
    outbound: UnboundedSender<Bytes>,
) {
    while let Some(pdu) = inbound.recv().await {
        if let Some(reply) = peer.reply(&pdu) {
            if outbound.send(reply).is_err() {
                break;
            }
        }
    }
}

async fn connect(user_id: u16) -> (u16, usize) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, mut client_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    tokio::spawn(serve(Peer::new(user_id), server_rx, server_tx));

    let transport = ChannelTransport {
        outbound: client_tx,
    };
    let mut client = McsClient::new(ClientConfig::default(), transport, move |event: McsEvent| {
        let _ = event_tx.send(event);
    });
    client.on_connect(0);
    while client.state() != SessionState::Connected {
        match client_rx.recv().await {
            Some(pdu) => client.on_data(pdu),
            None => client.on_close(),
        }
        assert!(!client.state().is_terminal(), "session stopped: {client:?}");
    }

    match event_rx.recv().await {
        Some(McsEvent::Connected { user_id, channels }) => (user_id, channels.len()),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_sessions_connect_concurrently() {
    init_tracing();

    let handles: Vec<_> = (0..16u16)
        .map(|index| tokio::spawn(connect(1010 + index)))
        .collect();

    let mut users = Vec::new();
    for handle in handles {
        let (user_id, channels) = handle.await.expect("session task");
        assert_eq!(channels, 2);
        users.push(user_id);
    }

    users.sort_unstable();
    assert_eq!(users, (1010..1026).collect::<Vec<u16>>());
}

#[tokio::test]
async fn sessions_on_one_task_do_not_interfere() {
    init_tracing();

    let (first, second) = tokio::join!(connect(1030), connect(1040));

    assert_eq!(first, (1030, 2));
    assert_eq!(second, (1040, 2));
}
