//! MCS wire format
//!
//! This module provides the T.125 connect PDUs, the domain PDU header, and
//! the BER, PER and GCC codecs they are built from.

pub mod ber;
mod codec;
mod connect;
mod domain;
mod error;
pub mod gcc;
mod header;
mod pdu;
pub mod per;
mod types;

pub use connect::{ConnectInitial, ConnectResponse, DOMAIN_SELECTOR};
pub use domain::DomainParameters;
pub use error::{Error, Result};
pub use header::{OPTIONS_MASK, PduHeader, read_header, write_header};
pub use pdu::{
    AttachUserConfirm, ChannelJoinConfirm, ChannelJoinRequest, DisconnectProviderUltimatum,
    REASON_USER_REQUESTED, attach_user_request, erect_domain_request,
};
pub use types::DomainPdu;

/// BER application tag of the Connect-Initial PDU
pub const MCS_TYPE_CONNECT_INITIAL: u8 = 0x65;

/// BER application tag of the Connect-Response PDU
pub const MCS_TYPE_CONNECT_RESPONSE: u8 = 0x66;

/// Channel id of the mandatory global channel
pub const MCS_GLOBAL_CHANNEL: u16 = 1003;

/// Offset added to the assigned user id to form the user channel id
pub const MCS_USERCHANNEL_BASE: u16 = 1001;
