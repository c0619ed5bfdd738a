//! MCS wire codec error types

use thiserror::Error;

use super::DomainPdu;

/// Errors produced while encoding or decoding MCS, BER, PER and GCC structures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer too small
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Tag byte did not match the expected ASN.1 tag
    #[error("unexpected tag: expected {expected:#04x}, got {found:#04x}")]
    UnexpectedTag {
        /// Expected tag byte
        expected: u8,
        /// Found tag byte
        found: u8,
    },

    /// Length field is malformed or inconsistent with its context
    #[error("invalid length for {context}: {len}")]
    InvalidLength {
        /// Structure being decoded
        context: &'static str,
        /// Offending length
        len: usize,
    },

    /// Integer encoded with a width the codec does not support
    #[error("unsupported integer width: {width} bytes")]
    UnsupportedIntegerWidth {
        /// Encoded width
        width: usize,
    },

    /// Integer outside the range of its field
    #[error("integer {value} outside range {min}..={max}")]
    IntegerOutOfRange {
        /// Value to encode or decoded value
        value: u32,
        /// Minimum allowed
        min: u32,
        /// Maximum allowed
        max: u32,
    },

    /// T.124 object identifier mismatch
    #[error("unexpected object identifier: {found:?}")]
    ObjectIdentifierMismatch {
        /// Decoded identifier
        found: [u8; 6],
    },

    /// H.221 key in a conference create PDU did not match
    #[error("unexpected H.221 key: expected {expected:?}, got {found:?}")]
    UnexpectedKey {
        /// Expected key
        expected: &'static [u8],
        /// Found bytes
        found: Vec<u8>,
    },

    /// MCS domain PDU header carried a different opcode
    #[error("unexpected MCS PDU: expected {expected}, got header {found:#04x}")]
    UnexpectedPdu {
        /// Expected PDU kind
        expected: DomainPdu,
        /// Raw header byte
        found: u8,
    },

    /// GCC user data block length field is invalid
    #[error("invalid length {len} for user data block {block_type:#06x}")]
    InvalidBlockLength {
        /// Block type
        block_type: u16,
        /// Declared length
        len: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
