#![allow(dead_code)]

use bytes::Bytes;
use mcs::protocol::gcc::{self, ServerCoreData, ServerNetworkData, ServerSecurityData};
use mcs::protocol::{
    AttachUserConfirm, ChannelJoinConfirm, ChannelJoinRequest, ConnectInitial, ConnectResponse,
    DomainParameters, DomainPdu, MCS_GLOBAL_CHANNEL, PduHeader,
};
use mcs::session::{EventSink, McsClient, Transport};

pub fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}

/// Transport that records every PDU the client writes.
#[derive(Debug, Default)]
pub struct Wire {
    pub sent: Vec<Bytes>,
    pub closed: bool,
}

impl Transport for Wire {
    fn write(&mut self, data: Bytes) {
        self.sent.push(data);
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl Wire {
    /// Channel ids of the Channel Join Requests written so far.
    pub fn join_requests(&self) -> Vec<u16> {
        self.sent
            .iter()
            .filter(|pdu| opcode(pdu) == Some(DomainPdu::ChannelJoinRequest))
            .map(|pdu| {
                ChannelJoinRequest::decode(pdu.clone())
                    .expect("join request")
                    .channel_id
            })
            .collect()
    }
}

pub fn opcode(pdu: &Bytes) -> Option<DomainPdu> {
    pdu.first()
        .and_then(|&byte| PduHeader::from_byte(byte))
        .map(|header| header.pdu())
}

pub fn server_core() -> ServerCoreData {
    ServerCoreData {
        rdp_version: gcc::RDP_VERSION_5_PLUS,
        client_requested_protocols: Some(0),
        early_capability_flags: Some(0),
    }
}

pub fn server_security() -> ServerSecurityData {
    ServerSecurityData {
        encryption_method: 0,
        encryption_level: 0,
        server_random: Bytes::new(),
        server_certificate: Bytes::new(),
    }
}

pub fn server_network(channel_ids: &[u16]) -> ServerNetworkData {
    ServerNetworkData {
        mcs_channel_id: MCS_GLOBAL_CHANNEL,
        channel_ids: channel_ids.to_vec(),
    }
}

/// Connect-Response carrying the given raw user data blocks.
pub fn connect_response(blocks: &[Vec<u8>]) -> Bytes {
    let user_data =
        gcc::write_conference_create_response(&blocks.concat()).expect("conference create");
    let parameters = DomainParameters::new(22, 3, 0, 1, 0, 1, 0xFFF8, 2);
    Bytes::from(ConnectResponse::new(0, 0, parameters, user_data).encode())
}

pub fn attach_user_confirm(user_id: u16) -> Bytes {
    let confirm = AttachUserConfirm {
        result: 0,
        initiator: Some(user_id),
    };
    Bytes::from(confirm.encode().expect("attach user confirm"))
}

pub fn join_confirm(user_id: u16, channel_id: u16) -> Bytes {
    Bytes::from(
        ChannelJoinConfirm::joined(user_id, channel_id)
            .encode()
            .expect("join confirm"),
    )
}

/// Server side of the handshake, answering each client PDU in turn.
#[derive(Debug, Clone)]
pub struct Peer {
    pub user_id: u16,
    pub static_channel_ids: Vec<u16>,
}

impl Peer {
    pub fn new(user_id: u16) -> Self {
        Self {
            user_id,
            static_channel_ids: Vec::new(),
        }
    }

    pub fn with_static_channels(mut self, ids: &[u16]) -> Self {
        self.static_channel_ids = ids.to_vec();
        self
    }

    pub fn reply(&self, pdu: &Bytes) -> Option<Bytes> {
        if pdu.starts_with(&[0x7F, 0x65]) {
            ConnectInitial::decode(pdu.clone()).expect("connect initial");
            return Some(connect_response(&[
                server_core().block().expect("server block"),
                server_security().block().expect("server block"),
                server_network(&self.static_channel_ids).block().expect("server block"),
            ]));
        }
        match opcode(pdu)? {
            DomainPdu::AttachUserRequest => Some(attach_user_confirm(self.user_id)),
            DomainPdu::ChannelJoinRequest => {
                let request = ChannelJoinRequest::decode(pdu.clone()).expect("join request");
                Some(join_confirm(request.initiator, request.channel_id))
            }
            _ => None,
        }
    }
}

/// Feed peer replies into the client until it stops writing.
pub fn run<E: EventSink>(client: &mut McsClient<Wire, E>, peer: &Peer) {
    let mut cursor = 0;
    while let Some(pdu) = client.transport().sent.get(cursor).cloned() {
        cursor += 1;
        if let Some(reply) = peer.reply(&pdu) {
            client.on_data(reply);
        }
    }
}
