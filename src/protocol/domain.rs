//! MCS domain parameters (T.125 section 7, `DomainParameters`)

use bytes::{BufMut, Bytes};

use super::{Result, ber};

/// Number of priorities fixed for RDP domains
pub const NUM_PRIORITIES: u32 = 1;
/// Minimum throughput fixed for RDP domains
pub const MIN_THROUGHPUT: u32 = 0;
/// Maximum domain height fixed for RDP domains
pub const MAX_HEIGHT: u32 = 1;
/// MCS protocol version 2
pub const PROTOCOL_VERSION: u32 = 2;

/// The eight negotiable domain parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainParameters {
    max_channel_ids: u32,
    max_user_ids: u32,
    max_token_ids: u32,
    num_priorities: u32,
    min_throughput: u32,
    max_height: u32,
    max_mcs_pdu_size: u32,
    protocol_version: u32,
}

impl DomainParameters {
    /// Create parameters from explicit values, in wire order
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        max_channel_ids: u32,
        max_user_ids: u32,
        max_token_ids: u32,
        num_priorities: u32,
        min_throughput: u32,
        max_height: u32,
        max_mcs_pdu_size: u32,
        protocol_version: u32,
    ) -> Self {
        Self {
            max_channel_ids,
            max_user_ids,
            max_token_ids,
            num_priorities,
            min_throughput,
            max_height,
            max_mcs_pdu_size,
            protocol_version,
        }
    }

    /// Target parameters proposed by a client
    #[must_use]
    pub const fn client_target() -> Self {
        Self::new(34, 2, 0, 1, 0, 1, 0xFFFF, 2)
    }

    /// Minimum parameters accepted by a client
    #[must_use]
    pub const fn client_minimum() -> Self {
        Self::new(1, 1, 1, 1, 0, 1, 0x420, 2)
    }

    /// Maximum parameters accepted by a client
    #[must_use]
    pub const fn client_maximum() -> Self {
        Self::new(0xFFFF, 0xFC17, 0xFFFF, 1, 0, 1, 0xFFFF, 2)
    }

    /// Copy with the priority, throughput, height and version fields forced
    /// to the values RDP mandates
    #[must_use]
    pub const fn pinned(self) -> Self {
        Self {
            num_priorities: NUM_PRIORITIES,
            min_throughput: MIN_THROUGHPUT,
            max_height: MAX_HEIGHT,
            protocol_version: PROTOCOL_VERSION,
            ..self
        }
    }

    /// Maximum channel ids
    #[must_use]
    pub const fn max_channel_ids(&self) -> u32 {
        self.max_channel_ids
    }

    /// Maximum user ids
    #[must_use]
    pub const fn max_user_ids(&self) -> u32 {
        self.max_user_ids
    }

    /// Maximum token ids
    #[must_use]
    pub const fn max_token_ids(&self) -> u32 {
        self.max_token_ids
    }

    /// Number of priorities
    #[must_use]
    pub const fn num_priorities(&self) -> u32 {
        self.num_priorities
    }

    /// Minimum throughput
    #[must_use]
    pub const fn min_throughput(&self) -> u32 {
        self.min_throughput
    }

    /// Maximum height
    #[must_use]
    pub const fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Maximum MCS PDU size
    #[must_use]
    pub const fn max_mcs_pdu_size(&self) -> u32 {
        self.max_mcs_pdu_size
    }

    /// Protocol version
    #[must_use]
    pub const fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn fields(&self) -> [u32; 8] {
        [
            self.max_channel_ids,
            self.max_user_ids,
            self.max_token_ids,
            self.num_priorities,
            self.min_throughput,
            self.max_height,
            self.max_mcs_pdu_size,
            self.protocol_version,
        ]
    }

    /// Encode as a BER SEQUENCE of eight INTEGERs
    pub fn encode(&self, buf: &mut impl BufMut) {
        let mut body = Vec::with_capacity(8 * 6);
        for value in self.fields() {
            ber::write_integer(value, &mut body);
        }
        ber::write_sequence(&body, buf);
    }

    /// Decode a BER SEQUENCE of eight INTEGERs
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        let mut body = ber::read_sequence(buf)?;
        let mut fields = [0u32; 8];
        for field in &mut fields {
            *field = ber::read_integer(&mut body)?;
        }
        let [a, b, c, d, e, f, g, h] = fields;
        Ok(Self::new(a, b, c, d, e, f, g, h))
    }
}
