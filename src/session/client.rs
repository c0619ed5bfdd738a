//! Client side MCS session state machine.

use std::fmt;
use std::io;

use bytes::Bytes;
use tracing::{debug, error, instrument, trace, warn};
use uuid::Uuid;

use super::channel::{ChannelRegistry, McsChannelInfo};
use super::config::ClientConfig;
use super::error::{Result, SessionError};
use super::transport::{EventSink, McsEvent, Transport};
use crate::protocol::gcc::{
    self, ServerBlock, ServerCoreData, ServerNetworkData, ServerSecurityData,
};
use crate::protocol::{
    AttachUserConfirm, ChannelJoinConfirm, ChannelJoinRequest, ConnectInitial, ConnectResponse,
    DisconnectProviderUltimatum, DomainPdu, Error as ProtocolError, MCS_GLOBAL_CHANNEL, PduHeader,
    REASON_USER_REQUESTED, attach_user_request, erect_domain_request,
};

/// Where the session is in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for the lower layer to finish its handshake.
    Idle,
    /// Connect-Initial sent.
    AwaitingConnectResponse,
    /// Erect Domain and Attach User requests sent.
    AwaitingAttachUserConfirm,
    /// Channel Join Request sent for `channel_id`.
    AwaitingChannelJoinConfirm {
        /// User channel id the join was issued for
        user_id: u16,
        /// Channel being joined
        channel_id: u16,
    },
    /// Every channel joined; inbound PDUs are forwarded.
    Connected,
    /// Handshake or transport failure.
    Failed,
    /// Closed locally or by the peer.
    Closed,
}

impl SessionState {
    /// Whether the session has stopped for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    /// Whether the handshake is still in progress.
    #[must_use]
    pub const fn is_handshaking(self) -> bool {
        matches!(
            self,
            Self::AwaitingConnectResponse
                | Self::AwaitingAttachUserConfirm
                | Self::AwaitingChannelJoinConfirm { .. }
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::AwaitingConnectResponse => f.write_str("awaiting connect response"),
            Self::AwaitingAttachUserConfirm => f.write_str("awaiting attach user confirm"),
            Self::AwaitingChannelJoinConfirm { channel_id, .. } => {
                write!(f, "awaiting join confirm for {channel_id}")
            }
            Self::Connected => f.write_str("connected"),
            Self::Failed => f.write_str("failed"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// MCS client session.
///
/// The session is driven entirely by its `on_*` notifications. Each call
/// performs at most one handshake step, writes the resulting PDUs to the
/// transport and records what it waits for next in [`SessionState`].
///
/// ```
/// use bytes::Bytes;
/// use mcs::session::{ClientConfig, McsClient, McsEvent, SessionState, Transport};
///
/// #[derive(Default)]
/// struct Sent(Vec<Bytes>);
///
/// impl Transport for Sent {
///     fn write(&mut self, data: Bytes) {
///         self.0.push(data);
///     }
///     fn close(&mut self) {}
/// }
///
/// let mut client = McsClient::new(ClientConfig::default(), Sent::default(), |_: McsEvent| {});
/// client.on_connect(0);
///
/// assert_eq!(client.state(), SessionState::AwaitingConnectResponse);
/// assert_eq!(&client.transport().0[0][..2], &[0x7f, 0x65]);
/// ```
pub struct McsClient<T, E> {
    id: Uuid,
    config: ClientConfig,
    transport: T,
    events: E,
    state: SessionState,
    channels: ChannelRegistry,
    next: usize,
    joined: usize,
    refused: Vec<u16>,
    user_id: Option<u16>,
    server_core: Option<ServerCoreData>,
    server_security: Option<ServerSecurityData>,
    server_network: Option<ServerNetworkData>,
}

impl<T, E> McsClient<T, E>
where
    T: Transport,
    E: EventSink,
{
    /// Create an idle session over `transport`, reporting to `events`.
    pub fn new(config: ClientConfig, transport: T, events: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            transport,
            events,
            state: SessionState::Idle,
            channels: ChannelRegistry::new(),
            next: 0,
            joined: 0,
            refused: Vec::new(),
            user_id: None,
            server_core: None,
            server_security: None,
            server_network: None,
        }
    }

    /// Lower layer handshake completed; send the Connect-Initial.
    ///
    /// `selected_protocol` is the protocol chosen during X.224 negotiation,
    /// echoed in the client core data.
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub fn on_connect(&mut self, selected_protocol: u32) {
        if self.state != SessionState::Idle {
            warn!(state = %self.state, "ignoring repeated connect notification");
            return;
        }

        match self.connect_initial(selected_protocol) {
            Ok(initial) => {
                debug!(
                    selected_protocol,
                    static_channels = self.config.static_channels.len(),
                    "sending connect initial"
                );
                self.send(initial.encode());
                self.state = SessionState::AwaitingConnectResponse;
            }
            Err(err) => self.fail(SessionError::MalformedConnectInitial(err)),
        }
    }

    /// One inbound PDU from the transport.
    #[instrument(level = "debug", skip_all, fields(session = %self.id, len = data.len()))]
    pub fn on_data(&mut self, data: Bytes) {
        let step = match self.state {
            SessionState::Idle => {
                warn!("dropping data received before connect");
                return;
            }
            SessionState::Failed | SessionState::Closed => {
                trace!(state = %self.state, "dropping data on stopped session");
                return;
            }
            SessionState::Connected => {
                self.recv_session_data(data);
                return;
            }
            _ if is_disconnect_ultimatum(&data) => {
                self.recv_disconnect(data);
                return;
            }
            SessionState::AwaitingConnectResponse => self.recv_connect_response(data),
            SessionState::AwaitingAttachUserConfirm => self.recv_attach_user_confirm(data),
            SessionState::AwaitingChannelJoinConfirm {
                user_id,
                channel_id,
            } => self.recv_channel_join_confirm(user_id, channel_id, data),
        };

        if let Err(err) = step {
            self.fail(err);
        }
    }

    /// Transport reported an error.
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub fn on_error(&mut self, err: io::Error) {
        if self.state.is_terminal() {
            trace!(error = %err, "ignoring transport error on stopped session");
            return;
        }
        self.fail(SessionError::Transport(err));
    }

    /// Transport closed.
    ///
    /// A close in the middle of the handshake is reported as a transport
    /// error before the close event.
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub fn on_close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        debug!(state = %self.state, "transport closed");
        self.close(
            io::ErrorKind::UnexpectedEof,
            "transport closed during mcs handshake",
        );
    }

    /// Leave the domain and close the transport.
    ///
    /// A connected session first sends a Disconnect Provider Ultimatum.
    /// Leaving in the middle of the handshake is reported as an error
    /// before the close event.
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if self.state == SessionState::Connected {
            let ultimatum = DisconnectProviderUltimatum {
                reason: REASON_USER_REQUESTED,
            };
            self.send(ultimatum.encode());
        }
        debug!(state = %self.state, "disconnecting");
        self.transport.close();
        self.close(
            io::ErrorKind::ConnectionAborted,
            "session disconnected during mcs handshake",
        );
    }

    /// Session id used in log records.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// User channel id, known once the Attach User Confirm arrives.
    #[must_use]
    pub const fn user_id(&self) -> Option<u16> {
        self.user_id
    }

    /// Channels in join order.
    #[must_use]
    pub const fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Number of channels the server let the session join.
    #[must_use]
    pub const fn joined(&self) -> usize {
        self.joined
    }

    /// Static channels the server refused, in join order.
    #[must_use]
    pub fn refused(&self) -> &[u16] {
        &self.refused
    }

    /// Server core data from the Connect-Response.
    #[must_use]
    pub const fn server_core(&self) -> Option<&ServerCoreData> {
        self.server_core.as_ref()
    }

    /// Server security data from the Connect-Response.
    #[must_use]
    pub const fn server_security(&self) -> Option<&ServerSecurityData> {
        self.server_security.as_ref()
    }

    /// Server network data from the Connect-Response.
    #[must_use]
    pub const fn server_network(&self) -> Option<&ServerNetworkData> {
        self.server_network.as_ref()
    }

    /// Configuration the session was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn connect_initial(&self, selected_protocol: u32) -> crate::protocol::Result<ConnectInitial> {
        let mut blocks = self.config.core_data(selected_protocol).block()?;
        blocks.extend_from_slice(&self.config.network_data().block()?);
        blocks.extend_from_slice(&self.config.security_data().block()?);
        let user_data = gcc::write_conference_create_request(&blocks)?;
        Ok(ConnectInitial::new(user_data))
    }

    fn recv_connect_response(&mut self, data: Bytes) -> Result<()> {
        let response =
            ConnectResponse::decode(data).map_err(SessionError::MalformedConnectResponse)?;
        if response.result() != ConnectResponse::RESULT_SUCCESSFUL {
            return Err(SessionError::ConnectRejected {
                result: response.result(),
            });
        }

        let parameters = response.domain_parameters();
        debug!(
            max_channel_ids = parameters.max_channel_ids(),
            max_mcs_pdu_size = parameters.max_mcs_pdu_size(),
            "connect response accepted"
        );

        let user_data = gcc::read_conference_create_response(response.user_data().clone())
            .map_err(SessionError::MalformedConnectResponse)?;
        // each block is decoded only once every block before it was accepted
        for block in gcc::blocks(user_data) {
            let block = block
                .and_then(|(tag, body)| ServerBlock::decode(tag, body))
                .map_err(SessionError::MalformedConnectResponse)?;
            match block {
                ServerBlock::Core(core) => {
                    trace!(rdp_version = core.rdp_version, "server core data");
                    self.server_core = Some(core);
                }
                ServerBlock::Security(security) => {
                    trace!(
                        encryption_method = security.encryption_method,
                        encryption_level = security.encryption_level,
                        "server security data"
                    );
                    self.server_security = Some(security);
                }
                ServerBlock::Network(network) => {
                    trace!(channels = network.channel_ids.len(), "server network data");
                    self.server_network = Some(network);
                }
                ServerBlock::Unrecognized { tag, .. } => {
                    return Err(SessionError::UnhandledCapabilityBlock { tag });
                }
            }
        }

        self.send(erect_domain_request());
        self.send(attach_user_request());
        self.state = SessionState::AwaitingAttachUserConfirm;
        Ok(())
    }

    fn recv_attach_user_confirm(&mut self, data: Bytes) -> Result<()> {
        let confirm = AttachUserConfirm::decode(data)
            .map_err(|err| SessionError::from_pdu(DomainPdu::AttachUserConfirm, err))?;
        if confirm.result != 0 {
            return Err(SessionError::UserRejected {
                result: confirm.result,
            });
        }
        let Some(user_id) = confirm.initiator else {
            return Err(SessionError::MalformedPdu {
                pdu: DomainPdu::AttachUserConfirm,
                source: ProtocolError::InvalidLength {
                    context: "attach user confirm initiator",
                    len: 0,
                },
            });
        };

        if self.channels.contains(user_id) {
            return Err(SessionError::UserChannelCollision { user_id });
        }

        debug!(user_id, "user attached");
        self.user_id = Some(user_id);
        self.channels
            .push(McsChannelInfo::new(user_id, ChannelRegistry::USER));
        self.register_static_channels();
        self.join_next(user_id)
    }

    fn register_static_channels(&mut self) {
        let Some(network) = &self.server_network else {
            return;
        };
        for (index, &id) in network.channel_ids.iter().enumerate() {
            if self.channels.contains(id) {
                warn!(channel_id = id, "skipping duplicate static channel");
                continue;
            }
            let name = self
                .config
                .static_channels
                .get(index)
                .map_or("static", |channel| channel.name.as_str());
            self.channels.push(McsChannelInfo::new(id, name));
        }
    }

    fn join_next(&mut self, user_id: u16) -> Result<()> {
        let Some(channel) = self.channels.get(self.next) else {
            self.connected(user_id);
            return Ok(());
        };
        debug!(%channel, "joining channel");

        let channel_id = channel.id;
        let request = ChannelJoinRequest {
            initiator: user_id,
            channel_id,
        }
        .encode()
        .map_err(|source| SessionError::MalformedPdu {
            pdu: DomainPdu::ChannelJoinRequest,
            source,
        })?;
        self.send(request);
        self.state = SessionState::AwaitingChannelJoinConfirm {
            user_id,
            channel_id,
        };
        Ok(())
    }

    fn recv_channel_join_confirm(
        &mut self,
        user_id: u16,
        channel_id: u16,
        data: Bytes,
    ) -> Result<()> {
        let confirm = ChannelJoinConfirm::decode(data)
            .map_err(|err| SessionError::from_pdu(DomainPdu::ChannelJoinConfirm, err))?;
        if confirm.initiator != user_id {
            return Err(SessionError::UnexpectedInitiator {
                expected: user_id,
                found: confirm.initiator,
            });
        }
        for confirmed in std::iter::once(confirm.requested).chain(confirm.channel_id) {
            if confirmed != channel_id {
                return Err(SessionError::ChannelJoinMismatch {
                    requested: channel_id,
                    confirmed,
                });
            }
        }

        if confirm.result != 0 {
            if channel_id == MCS_GLOBAL_CHANNEL || channel_id == user_id {
                return Err(SessionError::ChannelJoinRejected {
                    channel_id,
                    result: confirm.result,
                });
            }
            warn!(
                channel_id,
                result = confirm.result,
                "server refused static channel"
            );
            self.refused.push(channel_id);
        } else {
            trace!(channel_id, "channel joined");
            self.joined += 1;
        }

        self.next += 1;
        self.join_next(user_id)
    }

    fn connected(&mut self, user_id: u16) {
        debug!(
            user_id,
            joined = self.joined,
            refused = self.refused.len(),
            "mcs session connected"
        );
        self.state = SessionState::Connected;
        let channels = self
            .channels
            .iter()
            .filter(|channel| !self.refused.contains(&channel.id))
            .cloned()
            .collect();
        self.events.emit(McsEvent::Connected { user_id, channels });
    }

    fn recv_session_data(&mut self, data: Bytes) {
        if is_disconnect_ultimatum(&data) {
            self.recv_disconnect(data);
            return;
        }
        trace!("forwarding session data");
        self.events.emit(McsEvent::Data(data));
    }

    fn recv_disconnect(&mut self, data: Bytes) {
        match DisconnectProviderUltimatum::decode(data) {
            Ok(ultimatum) => debug!(reason = ultimatum.reason, "peer disconnected"),
            Err(err) => debug!(error = %err, "peer disconnected with malformed ultimatum"),
        }
        self.transport.close();
        self.close(
            io::ErrorKind::ConnectionAborted,
            "peer left the domain during mcs handshake",
        );
    }

    /// Stop for good, reporting an unfinished handshake as a transport error.
    fn close(&mut self, kind: io::ErrorKind, reason: &'static str) {
        if self.state.is_handshaking() {
            self.fail(SessionError::Transport(io::Error::new(kind, reason)));
        }
        self.state = SessionState::Closed;
        self.events.emit(McsEvent::Close);
    }

    fn fail(&mut self, err: SessionError) {
        error!(state = %self.state, error = %err, "mcs session failed");
        self.state = SessionState::Failed;
        self.events.emit(McsEvent::Error(err));
    }

    fn send(&mut self, pdu: Vec<u8>) {
        trace!(len = pdu.len(), "writing pdu");
        self.transport.write(Bytes::from(pdu));
    }
}

impl<T, E> fmt::Debug for McsClient<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McsClient")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("user_id", &self.user_id)
            .field("channels", &self.channels)
            .field("joined", &self.joined)
            .field("refused", &self.refused)
            .finish_non_exhaustive()
    }
}

fn is_disconnect_ultimatum(data: &Bytes) -> bool {
    data.first()
        .and_then(|&byte| PduHeader::from_byte(byte))
        .is_some_and(|header| header.pdu() == DomainPdu::DisconnectProviderUltimatum)
}
