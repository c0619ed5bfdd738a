//! MCS domain PDU kinds

use std::fmt;

/// MCS domain PDU kinds carried in the 6-bit opcode of the PDU header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DomainPdu {
    /// Erect domain request (client to server)
    ErectDomainRequest = 1,
    /// Disconnect provider ultimatum (either direction)
    DisconnectProviderUltimatum = 8,
    /// Attach user request (client to server)
    AttachUserRequest = 10,
    /// Attach user confirm (server to client)
    AttachUserConfirm = 11,
    /// Channel join request (client to server)
    ChannelJoinRequest = 14,
    /// Channel join confirm (server to client)
    ChannelJoinConfirm = 15,
    /// Send data request (client to server)
    SendDataRequest = 25,
    /// Send data indication (server to client)
    SendDataIndication = 26,
}

impl DomainPdu {
    /// Convert from opcode
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ErectDomainRequest),
            8 => Some(Self::DisconnectProviderUltimatum),
            10 => Some(Self::AttachUserRequest),
            11 => Some(Self::AttachUserConfirm),
            14 => Some(Self::ChannelJoinRequest),
            15 => Some(Self::ChannelJoinConfirm),
            25 => Some(Self::SendDataRequest),
            26 => Some(Self::SendDataIndication),
            _ => None,
        }
    }

    /// Convert to opcode
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DomainPdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ErectDomainRequest => "ErectDomainRequest",
            Self::DisconnectProviderUltimatum => "DisconnectProviderUltimatum",
            Self::AttachUserRequest => "AttachUserRequest",
            Self::AttachUserConfirm => "AttachUserConfirm",
            Self::ChannelJoinRequest => "ChannelJoinRequest",
            Self::ChannelJoinConfirm => "ChannelJoinConfirm",
            Self::SendDataRequest => "SendDataRequest",
            Self::SendDataIndication => "SendDataIndication",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_pdu_opcodes() {
        let kinds = [
            DomainPdu::ErectDomainRequest,
            DomainPdu::AttachUserConfirm,
            DomainPdu::ChannelJoinConfirm,
            DomainPdu::SendDataIndication,
        ];

        for kind in kinds {
            assert_eq!(DomainPdu::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(DomainPdu::AttachUserRequest.as_u8(), 10);
        assert_eq!(DomainPdu::from_u8(2), None);
    }
}
