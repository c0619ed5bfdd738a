//! MCS domain PDUs exchanged after the connect phase

use bytes::{BufMut, Bytes};

use super::codec::read_u8;
use super::{DomainPdu, MCS_USERCHANNEL_BASE, Result, per, read_header, write_header};

/// Option bit flagging the trailing optional field of a confirm
const OPTIONAL_FIELD_PRESENT: u8 = 0x02;

/// Disconnect reason `rn-user-requested`
pub const REASON_USER_REQUESTED: u8 = 3;

/// Encode an Erect Domain Request with sub-height and sub-interval 0
#[must_use]
pub fn erect_domain_request() -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    write_header(DomainPdu::ErectDomainRequest, 0, &mut out);
    per::write_integer(0, &mut out);
    per::write_integer(0, &mut out);
    out
}

/// Encode an Attach User Request
#[must_use]
pub fn attach_user_request() -> Vec<u8> {
    let mut out = Vec::with_capacity(1);
    write_header(DomainPdu::AttachUserRequest, 0, &mut out);
    out
}

/// Attach User Confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachUserConfirm {
    /// Result code, 0 on success
    pub result: u8,
    /// Assigned user channel id (base offset already applied)
    pub initiator: Option<u16>,
}

impl AttachUserConfirm {
    /// Encode, writing the initiator when present
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(4);
        let options = if self.initiator.is_some() {
            OPTIONAL_FIELD_PRESENT
        } else {
            0
        };
        write_header(DomainPdu::AttachUserConfirm, options, &mut out);
        per::write_enumerated(self.result, &mut out);
        if let Some(initiator) = self.initiator {
            per::write_integer16(initiator, MCS_USERCHANNEL_BASE, &mut out)?;
        }
        Ok(out)
    }

    /// Verify the header and decode the result
    ///
    /// The initiator is required after a successful result. A rejection
    /// never depends on the rest of the PDU: its initiator is kept only
    /// when flagged and complete.
    pub fn decode(mut bytes: Bytes) -> Result<Self> {
        let options = read_header(&mut bytes, DomainPdu::AttachUserConfirm)?;
        let result = per::read_enumerated(&mut bytes)?;
        let flagged = options & OPTIONAL_FIELD_PRESENT != 0;
        let initiator = if result == 0 {
            Some(per::read_integer16(&mut bytes, MCS_USERCHANNEL_BASE)?)
        } else if flagged && bytes.len() >= 2 {
            per::read_integer16(&mut bytes, MCS_USERCHANNEL_BASE).ok()
        } else {
            None
        };
        Ok(Self { result, initiator })
    }
}

/// Channel Join Request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelJoinRequest {
    /// Requesting user channel id
    pub initiator: u16,
    /// Channel to join
    pub channel_id: u16,
}

impl ChannelJoinRequest {
    /// Encode the request
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(5);
        write_header(DomainPdu::ChannelJoinRequest, 0, &mut out);
        per::write_integer16(self.initiator, MCS_USERCHANNEL_BASE, &mut out)?;
        per::write_integer16(self.channel_id, 0, &mut out)?;
        Ok(out)
    }

    /// Decode a request
    pub fn decode(mut bytes: Bytes) -> Result<Self> {
        read_header(&mut bytes, DomainPdu::ChannelJoinRequest)?;
        Ok(Self {
            initiator: per::read_integer16(&mut bytes, MCS_USERCHANNEL_BASE)?,
            channel_id: per::read_integer16(&mut bytes, 0)?,
        })
    }
}

/// Channel Join Confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelJoinConfirm {
    /// Result code, 0 on success
    pub result: u8,
    /// User channel id of the requester
    pub initiator: u16,
    /// Channel id echoed from the request
    pub requested: u16,
    /// Joined channel id, present on success
    pub channel_id: Option<u16>,
}

impl ChannelJoinConfirm {
    /// Successful confirm for `channel_id`
    #[must_use]
    pub const fn joined(initiator: u16, channel_id: u16) -> Self {
        Self {
            result: 0,
            initiator,
            requested: channel_id,
            channel_id: Some(channel_id),
        }
    }

    /// Encode, writing the joined channel id when present
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(8);
        let options = if self.channel_id.is_some() {
            OPTIONAL_FIELD_PRESENT
        } else {
            0
        };
        write_header(DomainPdu::ChannelJoinConfirm, options, &mut out);
        per::write_enumerated(self.result, &mut out);
        per::write_integer16(self.initiator, MCS_USERCHANNEL_BASE, &mut out)?;
        per::write_integer16(self.requested, 0, &mut out)?;
        if let Some(channel_id) = self.channel_id {
            per::write_integer16(channel_id, 0, &mut out)?;
        }
        Ok(out)
    }

    /// Verify the header and decode the confirm
    ///
    /// A flagged channel id must be present.
    pub fn decode(mut bytes: Bytes) -> Result<Self> {
        let options = read_header(&mut bytes, DomainPdu::ChannelJoinConfirm)?;
        let result = per::read_enumerated(&mut bytes)?;
        let initiator = per::read_integer16(&mut bytes, MCS_USERCHANNEL_BASE)?;
        let requested = per::read_integer16(&mut bytes, 0)?;
        let channel_id = if options & OPTIONAL_FIELD_PRESENT != 0 {
            Some(per::read_integer16(&mut bytes, 0)?)
        } else {
            None
        };
        Ok(Self {
            result,
            initiator,
            requested,
            channel_id,
        })
    }
}

/// Disconnect Provider Ultimatum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectProviderUltimatum {
    /// Disconnect reason (`rn-*`)
    pub reason: u8,
}

impl DisconnectProviderUltimatum {
    /// Encode; the 3-bit reason straddles the header options and next byte
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2);
        write_header(
            DomainPdu::DisconnectProviderUltimatum,
            (self.reason >> 1) & 0x01,
            &mut out,
        );
        out.put_u8((self.reason & 0x01) << 7);
        out
    }

    /// Verify the header and decode the reason
    pub fn decode(mut bytes: Bytes) -> Result<Self> {
        let options = read_header(&mut bytes, DomainPdu::DisconnectProviderUltimatum)?;
        let low = if bytes.is_empty() { 0 } else { read_u8(&mut bytes)? >> 7 };
        Ok(Self {
            reason: ((options & 0x01) << 1) | low,
        })
    }
}
