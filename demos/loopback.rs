//! MCS handshake against an in-memory server over TPKT framing
//!
//! Run with `RUST_LOG=debug cargo run --example loopback`.

use bytes::{BufMut, Bytes, BytesMut};
use mcs::protocol::gcc::{self, ChannelDef, ServerCoreData, ServerNetworkData, ServerSecurityData};
use mcs::protocol::{
    AttachUserConfirm, ChannelJoinConfirm, ChannelJoinRequest, ConnectInitial, ConnectResponse,
    DomainParameters, DomainPdu, PduHeader,
};
use mcs::session::{ClientConfig, McsClient, McsEvent, Transport};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing_subscriber::EnvFilter;

const TPKT_VERSION: u8 = 3;

/// Frames handed to a writer task; the session never blocks on I/O.
struct TpktTransport {
    frames: Option<UnboundedSender<Bytes>>,
}

impl Transport for TpktTransport {
    fn write(&mut self, data: Bytes) {
        if let Some(frames) = &self.frames {
            let _ = frames.send(data);
        }
    }

    fn close(&mut self) {
        self.frames = None;
    }
}

async fn write_frame(io: &mut (impl AsyncWrite + Unpin), pdu: &[u8]) -> std::io::Result<()> {
    let mut frame = BytesMut::with_capacity(4 + pdu.len());
    frame.put_u8(TPKT_VERSION);
    frame.put_u8(0);
    frame.put_u16(u16::try_from(4 + pdu.len()).map_err(std::io::Error::other)?);
    frame.put_slice(pdu);
    io.write_all(&frame).await
}

async fn read_frame(io: &mut (impl AsyncRead + Unpin)) -> std::io::Result<Bytes> {
    let mut header = [0u8; 4];
    io.read_exact(&mut header).await?;
    let len = usize::from(u16::from_be_bytes([header[2], header[3]]));
    let mut body = vec![0u8; len.saturating_sub(4)];
    io.read_exact(&mut body).await?;
    Ok(Bytes::from(body))
}

/// Answers the client handshake, assigning user id 1007 and two static channels.
async fn server(
    mut io: impl AsyncRead + AsyncWrite + Unpin,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let pdu = match read_frame(&mut io).await {
            Ok(pdu) => pdu,
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        if pdu.starts_with(&[0x7F, 0x65]) {
            let initial = ConnectInitial::decode(pdu)?;
            let client_blocks = gcc::read_conference_create_request(initial.user_data().clone())?;
            println!(
                "server: connect initial with {} bytes of client data",
                client_blocks.len()
            );

            let core = ServerCoreData {
                rdp_version: gcc::RDP_VERSION_5_PLUS,
                client_requested_protocols: Some(0),
                early_capability_flags: None,
            };
            let security = ServerSecurityData {
                encryption_method: 0,
                encryption_level: 0,
                server_random: Bytes::new(),
                server_certificate: Bytes::new(),
            };
            let network = ServerNetworkData {
                mcs_channel_id: 1003,
                channel_ids: vec![1004, 1005],
            };
            let mut blocks = core.block()?;
            blocks.extend_from_slice(&security.block()?);
            blocks.extend_from_slice(&network.block()?);
            let response = ConnectResponse::new(
                ConnectResponse::RESULT_SUCCESSFUL,
                0,
                DomainParameters::new(22, 3, 0, 1, 0, 1, 0xFFF8, 2),
                gcc::write_conference_create_response(&blocks)?,
            );
            write_frame(&mut io, &response.encode()).await?;
            continue;
        }

        let Some(header) = pdu.first().and_then(|&byte| PduHeader::from_byte(byte)) else {
            continue;
        };
        match header.pdu() {
            DomainPdu::ErectDomainRequest => println!("server: domain erected"),
            DomainPdu::AttachUserRequest => {
                let confirm = AttachUserConfirm {
                    result: 0,
                    initiator: Some(1007),
                };
                write_frame(&mut io, &confirm.encode()?).await?;
            }
            DomainPdu::ChannelJoinRequest => {
                let request = ChannelJoinRequest::decode(pdu)?;
                println!("server: join {}", request.channel_id);
                let confirm = ChannelJoinConfirm::joined(request.initiator, request.channel_id);
                write_frame(&mut io, &confirm.encode()?).await?;
            }
            DomainPdu::DisconnectProviderUltimatum => {
                println!("server: client left the domain");
                return Ok(());
            }
            other => println!("server: ignoring {other}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("MCS Loopback Example");
    println!("====================\n");

    let (client_io, server_io) = tokio::io::duplex(16 * 1024);
    let server_task = tokio::spawn(server(server_io));

    let (mut reader, mut writer) = tokio::io::split(client_io);
    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<Bytes>();
    let writer_task = tokio::spawn(async move {
        while let Some(pdu) = frames_rx.recv().await {
            write_frame(&mut writer, &pdu).await?;
        }
        writer.shutdown().await
    });

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let config = ClientConfig {
        client_name: String::from("loopback"),
        static_channels: vec![ChannelDef::new("rdpdr", 0), ChannelDef::new("cliprdr", 0)],
        ..ClientConfig::default()
    };
    let transport = TpktTransport {
        frames: Some(frames_tx),
    };
    let mut client = McsClient::new(config, transport, move |event: McsEvent| {
        let _ = events_tx.send(event);
    });

    client.on_connect(0);
    'session: loop {
        match read_frame(&mut reader).await {
            Ok(pdu) => client.on_data(pdu),
            Err(err) => client.on_error(err),
        }
        while let Ok(event) = events_rx.try_recv() {
            match event {
                McsEvent::Connected { user_id, channels } => {
                    println!("client: connected as user {user_id}");
                    for channel in &channels {
                        println!("client:   {channel}");
                    }
                    client.disconnect();
                }
                McsEvent::Data(data) => println!("client: {} bytes of session data", data.len()),
                McsEvent::Error(err) => return Err(err.into()),
                McsEvent::Close => break 'session,
            }
        }
    }

    writer_task.await??;
    server_task.await??;
    println!("\nMCS handshake complete");

    Ok(())
}
