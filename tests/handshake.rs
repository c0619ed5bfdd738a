mod common;

use std::io;
use std::sync::mpsc::{self, Receiver};

use bytes::Bytes;
use common::{
    Peer, Wire, attach_user_confirm, connect_response, init_tracing, join_confirm, opcode, run,
    server_core, server_network, server_security,
};
use mcs::protocol::DomainPdu;
use mcs::protocol::gcc::ChannelDef;
use mcs::session::{ClientConfig, McsChannelInfo, McsClient, McsEvent, SessionError, SessionState};

type Sink = Box<dyn FnMut(McsEvent) + Send>;

fn session(config: ClientConfig) -> (McsClient<Wire, Sink>, Receiver<McsEvent>) {
    init_tracing();
    let (tx, rx) = mpsc::channel();
    let sink: Sink = Box::new(move |event| {
        let _ = tx.send(event);
    });
    (McsClient::new(config, Wire::default(), sink), rx)
}

/// Session that has sent its Erect Domain and Attach User requests.
fn attaching(config: ClientConfig) -> (McsClient<Wire, Sink>, Receiver<McsEvent>) {
    let (mut client, rx) = session(config);
    client.on_connect(0);
    client.on_data(connect_response(&[
        server_core().block().unwrap(),
        server_security().block().unwrap(),
        server_network(&[]).block().unwrap(),
    ]));
    assert_eq!(client.state(), SessionState::AwaitingAttachUserConfirm);
    (client, rx)
}

#[test]
fn handshake_connects_with_global_and_user_channels() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    run(&mut client, &Peer::new(1006));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    match &events[0] {
        McsEvent::Connected { user_id, channels } => {
            assert_eq!(*user_id, 1006);
            assert_eq!(
                channels,
                &vec![
                    McsChannelInfo::new(1003, "global"),
                    McsChannelInfo::new(1006, "user")
                ]
            );
        }
        other => panic!("unexpected event {other:?}"),
    }

    let wire = client.transport();
    assert_eq!(wire.join_requests(), vec![1003, 1006]);
    // connect initial, erect domain, attach user, two joins
    assert_eq!(wire.sent.len(), 5);
    assert_eq!(
        opcode(wire.sent.last().expect("writes")),
        Some(DomainPdu::ChannelJoinRequest)
    );
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.joined(), 2);
}

#[test]
fn connected_session_writes_nothing_more_and_forwards_data() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    run(&mut client, &Peer::new(1006));
    let writes = client.transport().sent.len();

    let indication = Bytes::from_static(&[0x68, 0x00, 0x05, 0x03, 0xEB, 0x70, 0x02, 0xAB, 0xCD]);
    client.on_data(indication.clone());

    assert_eq!(client.transport().sent.len(), writes);
    let events: Vec<McsEvent> = rx.try_iter().collect();
    match &events[..] {
        [McsEvent::Connected { .. }, McsEvent::Data(data)] => assert_eq!(*data, indication),
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn server_blocks_are_all_recorded() {
    let (client, rx) = attaching(ClientConfig::default());

    assert_eq!(client.server_core(), Some(&server_core()));
    assert_eq!(client.server_security(), Some(&server_security()));
    assert_eq!(client.server_network(), Some(&server_network(&[])));
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn unknown_server_block_fails_once() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    let message_channel = vec![0x04, 0x0C, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
    client.on_data(connect_response(&[
        server_core().block().unwrap(),
        server_security().block().unwrap(),
        message_channel,
        server_network(&[]).block().unwrap(),
    ]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::UnhandledCapabilityBlock { tag: 0x0C04 })]
    ));
    assert!(client.server_core().is_some());
    assert!(client.server_security().is_some());
    assert!(client.server_network().is_none());
    assert_eq!(client.state(), SessionState::Failed);
    // only the connect initial went out
    assert_eq!(client.transport().sent.len(), 1);
}

#[test]
fn unknown_server_block_stops_before_later_blocks_decode() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    let message_channel = vec![0x04, 0x0C, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
    // network block holding only the I/O channel id
    let short_network = vec![0x03, 0x0C, 0x06, 0x00, 0xEB, 0x03];
    client.on_data(connect_response(&[
        server_core().block().unwrap(),
        message_channel,
        short_network,
    ]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::UnhandledCapabilityBlock { tag: 0x0C04 })]
    ));
    assert_eq!(client.server_core(), Some(&server_core()));
    assert!(client.server_network().is_none());
    assert_eq!(client.state(), SessionState::Failed);
}

#[test]
fn malformed_known_block_before_unknown_one_is_reported() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    let short_network = vec![0x03, 0x0C, 0x06, 0x00, 0xEB, 0x03];
    let message_channel = vec![0x04, 0x0C, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
    client.on_data(connect_response(&[
        server_core().block().unwrap(),
        short_network,
        message_channel,
    ]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::MalformedConnectResponse(_))]
    ));
    assert!(client.server_core().is_some());
}

#[test]
fn malformed_connect_response_is_reported() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    client.on_data(Bytes::from_static(&[0x7F, 0x66, 0x05, 0x0A]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::MalformedConnectResponse(_))]
    ));
}

#[test]
fn attach_user_confirm_with_wrong_opcode_is_bad_header() {
    let (mut client, rx) = attaching(ClientConfig::default());
    // opcode 10 followed by what would be a rejection result
    client.on_data(Bytes::from_static(&[0x28, 0x01]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::MalformedHeader {
            expected: DomainPdu::AttachUserConfirm,
            found: 0x28
        })]
    ));
    assert_eq!(client.user_id(), None);
}

#[test]
fn rejected_user_fails_session() {
    let (mut client, rx) = attaching(ClientConfig::default());
    client.on_data(Bytes::from_static(&[0x2C, 0x01]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::UserRejected { result: 1 })]
    ));
    assert_eq!(client.channels().len(), 1);
    assert_eq!(client.transport().join_requests(), Vec::<u16>::new());
}

#[test]
fn flagged_rejection_without_initiator_fails_as_rejected_user() {
    let (mut client, rx) = attaching(ClientConfig::default());
    client.on_data(Bytes::from_static(&[0x2E, 0x01]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::UserRejected { result: 1 })]
    ));
    assert_eq!(client.user_id(), None);
}

#[test]
fn attach_user_confirm_registers_user_channel() {
    let (mut client, _rx) = attaching(ClientConfig::default());
    // assigned id 5 on the wire
    client.on_data(Bytes::from_static(&[0x2E, 0x00, 0x00, 0x05]));

    assert_eq!(client.user_id(), Some(1006));
    assert_eq!(
        client.channels().as_slice(),
        &[
            McsChannelInfo::new(1003, "global"),
            McsChannelInfo::new(1006, "user")
        ]
    );
}

#[test]
fn join_confirm_for_other_channel_halts_joins() {
    let (mut client, rx) = attaching(ClientConfig::default());
    client.on_data(attach_user_confirm(1006));
    client.on_data(join_confirm(1006, 1004));
    client.on_data(join_confirm(1006, 1006));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::ChannelJoinMismatch {
            requested: 1003,
            confirmed: 1004
        })]
    ));
    assert_eq!(client.transport().join_requests(), vec![1003]);
    assert_eq!(client.joined(), 0);
}

#[test]
fn flagged_join_confirm_without_channel_id_is_malformed() {
    let (mut client, rx) = attaching(ClientConfig::default());
    client.on_data(attach_user_confirm(1006));
    // success result with the channel id flag set but the id missing
    client.on_data(Bytes::from_static(&[0x3E, 0x00, 0x00, 0x05, 0x03, 0xEB]));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::MalformedPdu {
            pdu: DomainPdu::ChannelJoinConfirm,
            ..
        })]
    ));
    assert_eq!(client.joined(), 0);
}

#[test]
fn static_channels_join_after_user_channel() {
    let config = ClientConfig {
        static_channels: vec![ChannelDef::new("rdpdr", 0), ChannelDef::new("cliprdr", 0)],
        ..ClientConfig::default()
    };
    let (mut client, rx) = session(config);
    client.on_connect(0);
    run(
        &mut client,
        &Peer::new(1007).with_static_channels(&[1004, 1005]),
    );

    assert_eq!(client.transport().join_requests(), vec![1003, 1007, 1004, 1005]);
    let events: Vec<McsEvent> = rx.try_iter().collect();
    match &events[..] {
        [McsEvent::Connected { user_id, channels }] => {
            assert_eq!(*user_id, 1007);
            let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["global", "user", "rdpdr", "cliprdr"]);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn close_while_waiting_reports_error_then_close() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    client.on_close();
    client.on_data(connect_response(&[server_core().block().unwrap()]));
    client.on_close();

    let events: Vec<McsEvent> = rx.try_iter().collect();
    match &events[..] {
        [McsEvent::Error(SessionError::Transport(err)), McsEvent::Close] => {
            assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        }
        other => panic!("unexpected events {other:?}"),
    }
    assert_eq!(client.state(), SessionState::Closed);
    assert_eq!(client.transport().sent.len(), 1);
}

#[test]
fn transport_error_stops_handshake() {
    let (mut client, rx) = attaching(ClientConfig::default());
    client.on_error(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"));
    client.on_data(attach_user_confirm(1006));

    let events: Vec<McsEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[..],
        [McsEvent::Error(SessionError::Transport(_))]
    ));
    assert_eq!(client.transport().sent.len(), 3);
}

#[test]
fn disconnect_after_connect_sends_ultimatum() {
    let (mut client, rx) = session(ClientConfig::default());
    client.on_connect(0);
    run(&mut client, &Peer::new(1006));
    client.disconnect();

    let wire = client.transport();
    assert_eq!(
        opcode(wire.sent.last().expect("writes")),
        Some(DomainPdu::DisconnectProviderUltimatum)
    );
    assert!(wire.closed);
    let names: Vec<&str> = rx.try_iter().map(|event| event.name()).collect();
    assert_eq!(names, vec!["connect", "close"]);
}
