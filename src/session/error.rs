//! Session-level failures. Every variant is terminal for the session.

use std::io;

use thiserror::Error;

use crate::protocol::{self, DomainPdu};

/// Reasons an MCS session fails
#[derive(Error, Debug)]
pub enum SessionError {
    /// Error reported by the underlying transport
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// PDU header carried an unexpected opcode
    #[error("bad MCS header: expected {expected}, got {found:#04x}")]
    MalformedHeader {
        /// PDU kind the session was waiting for
        expected: DomainPdu,
        /// Raw header byte received
        found: u8,
    },

    /// Client user data could not be encoded into a Connect-Initial
    #[error("cannot encode connect initial: {0}")]
    MalformedConnectInitial(#[source] protocol::Error),

    /// Connect-Response or its GCC payload could not be decoded
    #[error("malformed connect response: {0}")]
    MalformedConnectResponse(#[source] protocol::Error),

    /// Server refused the connection in its Connect-Response
    #[error("server rejected connect: result {result}")]
    ConnectRejected {
        /// Connect-Response result code
        result: u8,
    },

    /// Server user data contained a block the session cannot classify
    #[error("unhandled server capability block {tag:#06x}")]
    UnhandledCapabilityBlock {
        /// Block type
        tag: u16,
    },

    /// Attach User Confirm carried a non-zero result
    #[error("server rejected user: result {result}")]
    UserRejected {
        /// Attach User Confirm result code
        result: u8,
    },

    /// Assigned user channel id is already registered
    #[error("user channel {user_id} collides with a registered channel")]
    UserChannelCollision {
        /// User channel id from the Attach User Confirm
        user_id: u16,
    },

    /// Channel Join Confirm answered a different channel
    #[error("channel join mismatch: requested {requested}, confirmed {confirmed}")]
    ChannelJoinMismatch {
        /// Channel id sent in the request
        requested: u16,
        /// Channel id echoed by the server
        confirmed: u16,
    },

    /// Server refused to join a mandatory channel
    #[error("server rejected join of channel {channel_id}: result {result}")]
    ChannelJoinRejected {
        /// Channel id
        channel_id: u16,
        /// Channel Join Confirm result code
        result: u8,
    },

    /// Channel Join Confirm addressed another user
    #[error("unexpected initiator: expected user {expected}, got {found}")]
    UnexpectedInitiator {
        /// Session user channel id
        expected: u16,
        /// Initiator in the confirm
        found: u16,
    },

    /// Domain PDU was truncated or otherwise undecodable
    #[error("malformed {pdu}: {source}")]
    MalformedPdu {
        /// PDU kind being decoded
        pdu: DomainPdu,
        /// Codec failure
        #[source]
        source: protocol::Error,
    },
}

impl SessionError {
    /// Map a domain PDU decode failure, separating header mismatches
    pub(crate) fn from_pdu(pdu: DomainPdu, err: protocol::Error) -> Self {
        match err {
            protocol::Error::UnexpectedPdu { expected, found } => {
                Self::MalformedHeader { expected, found }
            }
            source => Self::MalformedPdu { pdu, source },
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_mismatch_is_distinguished() {
        let err = SessionError::from_pdu(
            DomainPdu::AttachUserConfirm,
            protocol::Error::UnexpectedPdu {
                expected: DomainPdu::AttachUserConfirm,
                found: 0x28,
            },
        );
        assert!(matches!(
            err,
            SessionError::MalformedHeader { found: 0x28, .. }
        ));

        let err = SessionError::from_pdu(
            DomainPdu::ChannelJoinConfirm,
            protocol::Error::BufferTooSmall { needed: 2, got: 0 },
        );
        assert!(matches!(
            err,
            SessionError::MalformedPdu {
                pdu: DomainPdu::ChannelJoinConfirm,
                ..
            }
        ));
    }

    #[test]
    fn test_display_messages() {
        let err = SessionError::UserRejected { result: 1 };
        assert_eq!(err.to_string(), "server rejected user: result 1");

        let err = SessionError::MalformedHeader {
            expected: DomainPdu::AttachUserConfirm,
            found: 0x28,
        };
        assert_eq!(
            err.to_string(),
            "bad MCS header: expected AttachUserConfirm, got 0x28"
        );

        let err = SessionError::UserChannelCollision { user_id: 1003 };
        assert_eq!(
            err.to_string(),
            "user channel 1003 collides with a registered channel"
        );
    }
}
