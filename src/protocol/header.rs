//! MCS domain PDU header
//!
//! Every in-session MCS PDU starts with a single byte carrying the PDU kind
//! and two option bits.

use bytes::{BufMut, Bytes};

use super::codec::read_u8;
use super::{DomainPdu, Error, Result};

/// Mask for the two option bits
pub const OPTIONS_MASK: u8 = 0x03;

/// MCS domain PDU header (1 byte)
///
/// # Wire Format
///
/// ```text
///  0 1 2 3 4 5 6 7
/// +-+-+-+-+-+-+-+-+
/// |  opcode   |opt|
/// +-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pdu: DomainPdu,
    options: u8,
}

impl PduHeader {
    /// Create a new header; option bits beyond the low two are discarded
    #[must_use]
    pub const fn new(pdu: DomainPdu, options: u8) -> Self {
        Self {
            pdu,
            options: options & OPTIONS_MASK,
        }
    }

    /// Get PDU kind
    #[must_use]
    pub const fn pdu(&self) -> DomainPdu {
        self.pdu
    }

    /// Get option bits
    #[must_use]
    pub const fn options(&self) -> u8 {
        self.options
    }

    /// Convert to the wire byte
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        (self.pdu.as_u8() << 2) | self.options
    }

    /// Parse any known header byte
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        DomainPdu::from_u8(byte >> 2).map(|pdu| Self::new(pdu, byte))
    }

    /// Append the header byte to `buf`
    pub fn write(self, buf: &mut impl BufMut) {
        buf.put_u8(self.to_byte());
    }
}

/// Write a header for `pdu` with the given option bits
pub fn write_header(pdu: DomainPdu, options: u8, buf: &mut impl BufMut) {
    PduHeader::new(pdu, options).write(buf);
}

/// Read the header byte and verify it carries `expected`
///
/// Returns the option bits on success. Nothing past the header is consumed
/// when the opcode does not match.
pub fn read_header(buf: &mut Bytes, expected: DomainPdu) -> Result<u8> {
    let byte = read_u8(buf)?;
    if byte >> 2 != expected.as_u8() {
        return Err(Error::UnexpectedPdu {
            expected,
            found: byte,
        });
    }
    Ok(byte & OPTIONS_MASK)
}
