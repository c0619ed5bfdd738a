//! GCC (T.124) conference create wrappers and RDP user data blocks
//!
//! The client's core, network and security blocks travel inside a T.124
//! Conference Create Request which is itself the user data of the MCS
//! Connect Initial. The server answers with a Conference Create Response
//! whose user data is a sequence of server blocks.

use bytes::{BufMut, Bytes};

use super::codec::{ensure, read_bytes, read_u16_le, read_u32_le};
use super::{Error, Result, per};

/// T.124 object identifier `{ itu-t(0) recommendation(0) t(20) t124(124) version(0) 1 }`
pub const T124_02_98_OID: [u8; 6] = [0, 0, 20, 124, 0, 1];
/// H.221 non-standard key used by clients
pub const H221_CS_KEY: &[u8] = b"Duca";
/// H.221 non-standard key used by servers
pub const H221_SC_KEY: &[u8] = b"McDn";

/// Client core data block type
pub const CS_CORE: u16 = 0xC001;
/// Client security data block type
pub const CS_SECURITY: u16 = 0xC002;
/// Client network data block type
pub const CS_NET: u16 = 0xC003;
/// Server core data block type
pub const SC_CORE: u16 = 0x0C01;
/// Server security data block type
pub const SC_SECURITY: u16 = 0x0C02;
/// Server network data block type
pub const SC_NET: u16 = 0x0C03;

/// Size of a user data block header
pub const BLOCK_HEADER_SIZE: usize = 4;

/// RDP 5.0 and later
pub const RDP_VERSION_5_PLUS: u32 = 0x0008_0004;
/// 8 bpp color depth marker
pub const RNS_UD_COLOR_8BPP: u16 = 0xCA01;
/// Secure attention sequence: Ctrl+Alt+Del
pub const RNS_UD_SAS_DEL: u16 = 0xAA03;
/// IBM enhanced (101 or 102 key) keyboard
pub const KEYBOARD_TYPE_IBM_101_102: u32 = 4;
/// 24 bpp supported
pub const RNS_UD_24BPP_SUPPORT: u16 = 0x0001;
/// 16 bpp supported
pub const RNS_UD_16BPP_SUPPORT: u16 = 0x0002;
/// 15 bpp supported
pub const RNS_UD_15BPP_SUPPORT: u16 = 0x0004;
/// 32 bpp supported
pub const RNS_UD_32BPP_SUPPORT: u16 = 0x0008;
/// Client supports the Set Error Info PDU
pub const RNS_UD_CS_SUPPORT_ERRINFO_PDU: u16 = 0x0001;

/// 40-bit RC4 encryption
pub const ENCRYPTION_FLAG_40BIT: u32 = 0x0000_0001;
/// 128-bit RC4 encryption
pub const ENCRYPTION_FLAG_128BIT: u32 = 0x0000_0002;
/// 56-bit RC4 encryption
pub const ENCRYPTION_FLAG_56BIT: u32 = 0x0000_0008;
/// FIPS 140-1 encryption
pub const ENCRYPTION_FLAG_FIPS: u32 = 0x0000_0010;

const CLIENT_NAME_SIZE: usize = 32;
const IME_FILE_NAME_SIZE: usize = 64;
const DIG_PRODUCT_ID_SIZE: usize = 64;
const CHANNEL_NAME_SIZE: usize = 8;

fn write_block_header(block_type: u16, body_len: usize, buf: &mut impl BufMut) -> Result<()> {
    let len = body_len + BLOCK_HEADER_SIZE;
    let len = u16::try_from(len).map_err(|_| Error::InvalidBlockLength { block_type, len })?;
    buf.put_u16_le(block_type);
    buf.put_u16_le(len);
    Ok(())
}

fn checked_len<T: TryFrom<usize>>(context: &'static str, len: usize) -> Result<T> {
    T::try_from(len).map_err(|_| Error::InvalidLength { context, len })
}

/// Client core data (`TS_UD_CS_CORE`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCoreData {
    /// RDP version
    pub version: u32,
    /// Desktop width in pixels
    pub desktop_width: u16,
    /// Desktop height in pixels
    pub desktop_height: u16,
    /// Legacy color depth
    pub color_depth: u16,
    /// Secure attention sequence
    pub sas_sequence: u16,
    /// Active input locale identifier
    pub keyboard_layout: u32,
    /// Client build number
    pub client_build: u32,
    /// Client computer name, truncated to 15 UTF-16 code units
    pub client_name: String,
    /// Keyboard type
    pub keyboard_type: u32,
    /// Keyboard sub type
    pub keyboard_sub_type: u32,
    /// Number of function keys
    pub keyboard_fn_keys: u32,
    /// Post beta 2 color depth
    pub post_beta2_color_depth: u16,
    /// Client product id
    pub client_product_id: u16,
    /// Serial number
    pub serial_number: u32,
    /// Requested color depth in bits per pixel
    pub high_color_depth: u16,
    /// Supported color depths bitmap
    pub supported_color_depths: u16,
    /// Early capability flags
    pub early_capability_flags: u16,
    /// Connection type hint
    pub connection_type: u8,
    /// Protocol selected by the server during X.224 negotiation
    pub server_selected_protocol: u32,
}

impl Default for ClientCoreData {
    fn default() -> Self {
        Self {
            version: RDP_VERSION_5_PLUS,
            desktop_width: 1024,
            desktop_height: 768,
            color_depth: RNS_UD_COLOR_8BPP,
            sas_sequence: RNS_UD_SAS_DEL,
            keyboard_layout: 0x0409,
            client_build: 3790,
            client_name: String::from("mcs"),
            keyboard_type: KEYBOARD_TYPE_IBM_101_102,
            keyboard_sub_type: 0,
            keyboard_fn_keys: 12,
            post_beta2_color_depth: RNS_UD_COLOR_8BPP,
            client_product_id: 1,
            serial_number: 0,
            high_color_depth: 24,
            supported_color_depths: RNS_UD_15BPP_SUPPORT
                | RNS_UD_16BPP_SUPPORT
                | RNS_UD_24BPP_SUPPORT
                | RNS_UD_32BPP_SUPPORT,
            early_capability_flags: RNS_UD_CS_SUPPORT_ERRINFO_PDU,
            connection_type: 0,
            server_selected_protocol: 0,
        }
    }
}

impl ClientCoreData {
    /// Body size in bytes, excluding the block header
    pub const BODY_SIZE: usize = 212;

    /// Serialize as a user data block, header included
    pub fn block(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE + Self::BODY_SIZE);
        write_block_header(CS_CORE, Self::BODY_SIZE, &mut out)?;
        out.put_u32_le(self.version);
        out.put_u16_le(self.desktop_width);
        out.put_u16_le(self.desktop_height);
        out.put_u16_le(self.color_depth);
        out.put_u16_le(self.sas_sequence);
        out.put_u32_le(self.keyboard_layout);
        out.put_u32_le(self.client_build);
        put_utf16_fixed(&self.client_name, CLIENT_NAME_SIZE, &mut out);
        out.put_u32_le(self.keyboard_type);
        out.put_u32_le(self.keyboard_sub_type);
        out.put_u32_le(self.keyboard_fn_keys);
        out.put_bytes(0, IME_FILE_NAME_SIZE);
        out.put_u16_le(self.post_beta2_color_depth);
        out.put_u16_le(self.client_product_id);
        out.put_u32_le(self.serial_number);
        out.put_u16_le(self.high_color_depth);
        out.put_u16_le(self.supported_color_depths);
        out.put_u16_le(self.early_capability_flags);
        out.put_bytes(0, DIG_PRODUCT_ID_SIZE);
        out.put_u8(self.connection_type);
        out.put_u8(0); // pad1octet
        out.put_u32_le(self.server_selected_protocol);
        Ok(out)
    }
}

/// UTF-16LE, null terminated, zero padded to `size` bytes
fn put_utf16_fixed(value: &str, size: usize, buf: &mut impl BufMut) {
    let max_units = size / 2 - 1;
    let mut written = 0;
    for unit in value.encode_utf16().take(max_units) {
        buf.put_u16_le(unit);
        written += 2;
    }
    buf.put_bytes(0, size - written);
}

/// Client security data (`TS_UD_CS_SEC`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSecurityData {
    /// Supported encryption methods
    pub encryption_methods: u32,
    /// French locale encryption methods
    pub ext_encryption_methods: u32,
}

impl Default for ClientSecurityData {
    fn default() -> Self {
        Self {
            encryption_methods: ENCRYPTION_FLAG_40BIT
                | ENCRYPTION_FLAG_56BIT
                | ENCRYPTION_FLAG_128BIT,
            ext_encryption_methods: 0,
        }
    }
}

impl ClientSecurityData {
    /// Serialize as a user data block, header included
    pub fn block(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE + 8);
        write_block_header(CS_SECURITY, 8, &mut out)?;
        out.put_u32_le(self.encryption_methods);
        out.put_u32_le(self.ext_encryption_methods);
        Ok(out)
    }
}

/// Static virtual channel requested by the client (`CHANNEL_DEF`)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelDef {
    /// ANSI channel name, at most 7 characters
    pub name: String,
    /// `CHANNEL_OPTION_*` flags
    pub options: u32,
}

impl ChannelDef {
    /// Create a channel definition
    pub fn new(name: impl Into<String>, options: u32) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// Client network data (`TS_UD_CS_NET`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientNetworkData {
    /// Requested static virtual channels
    pub channels: Vec<ChannelDef>,
}

impl ClientNetworkData {
    /// Serialize as a user data block, header included
    pub fn block(&self) -> Result<Vec<u8>> {
        let body_len = 4 + self.channels.len() * (CHANNEL_NAME_SIZE + 4);
        let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE + body_len);
        write_block_header(CS_NET, body_len, &mut out)?;
        out.put_u32_le(checked_len("client channel count", self.channels.len())?);
        for channel in &self.channels {
            let name = channel.name.as_bytes();
            let len = name.len().min(CHANNEL_NAME_SIZE - 1);
            out.put_slice(&name[..len]);
            out.put_bytes(0, CHANNEL_NAME_SIZE - len);
            out.put_u32_le(channel.options);
        }
        Ok(out)
    }
}

/// Server core data (`TS_UD_SC_CORE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCoreData {
    /// RDP version implemented by the server
    pub rdp_version: u32,
    /// Protocols the client originally requested, echoed by newer servers
    pub client_requested_protocols: Option<u32>,
    /// Early capability flags, sent by newer servers
    pub early_capability_flags: Option<u32>,
}

impl ServerCoreData {
    fn decode(mut body: Bytes) -> Result<Self> {
        let rdp_version = read_u32_le(&mut body)?;
        let client_requested_protocols = if body.len() >= 4 {
            Some(read_u32_le(&mut body)?)
        } else {
            None
        };
        let early_capability_flags = if body.len() >= 4 {
            Some(read_u32_le(&mut body)?)
        } else {
            None
        };
        Ok(Self {
            rdp_version,
            client_requested_protocols,
            early_capability_flags,
        })
    }

    /// Serialize as a user data block, header included
    pub fn block(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(12);
        body.put_u32_le(self.rdp_version);
        if let Some(protocols) = self.client_requested_protocols {
            body.put_u32_le(protocols);
            if let Some(flags) = self.early_capability_flags {
                body.put_u32_le(flags);
            }
        }
        wrap_block(SC_CORE, &body)
    }
}

/// Server security data (`TS_UD_SC_SEC1`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSecurityData {
    /// Selected encryption method
    pub encryption_method: u32,
    /// Selected encryption level
    pub encryption_level: u32,
    /// Server random, empty when encryption is off
    pub server_random: Bytes,
    /// Raw server certificate, empty when encryption is off
    pub server_certificate: Bytes,
}

impl ServerSecurityData {
    fn decode(mut body: Bytes) -> Result<Self> {
        let encryption_method = read_u32_le(&mut body)?;
        let encryption_level = read_u32_le(&mut body)?;
        let (server_random, server_certificate) =
            if (encryption_method != 0 || encryption_level != 0) && !body.is_empty() {
                let random_len = read_u32_le(&mut body)? as usize;
                let certificate_len = read_u32_le(&mut body)? as usize;
                (
                    read_bytes(&mut body, random_len)?,
                    read_bytes(&mut body, certificate_len)?,
                )
            } else {
                (Bytes::new(), Bytes::new())
            };
        Ok(Self {
            encryption_method,
            encryption_level,
            server_random,
            server_certificate,
        })
    }

    /// Serialize as a user data block, header included
    pub fn block(&self) -> Result<Vec<u8>> {
        let mut body =
            Vec::with_capacity(16 + self.server_random.len() + self.server_certificate.len());
        body.put_u32_le(self.encryption_method);
        body.put_u32_le(self.encryption_level);
        if !self.server_random.is_empty() || !self.server_certificate.is_empty() {
            body.put_u32_le(checked_len("server random", self.server_random.len())?);
            body.put_u32_le(checked_len("server certificate", self.server_certificate.len())?);
            body.put_slice(&self.server_random);
            body.put_slice(&self.server_certificate);
        }
        wrap_block(SC_SECURITY, &body)
    }
}

/// Server network data (`TS_UD_SC_NET`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNetworkData {
    /// I/O channel id, normally the global channel
    pub mcs_channel_id: u16,
    /// Ids assigned to the requested static channels, in request order
    pub channel_ids: Vec<u16>,
}

impl ServerNetworkData {
    fn decode(mut body: Bytes) -> Result<Self> {
        let mcs_channel_id = read_u16_le(&mut body)?;
        let count = usize::from(read_u16_le(&mut body)?);
        ensure(&body, count * 2)?;
        let mut channel_ids = Vec::with_capacity(count);
        for _ in 0..count {
            channel_ids.push(read_u16_le(&mut body)?);
        }
        // trailing pad word after an odd count is optional in practice
        Ok(Self {
            mcs_channel_id,
            channel_ids,
        })
    }

    /// Serialize as a user data block, header included
    pub fn block(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(4 + self.channel_ids.len() * 2 + 2);
        body.put_u16_le(self.mcs_channel_id);
        body.put_u16_le(checked_len("server channel count", self.channel_ids.len())?);
        for id in &self.channel_ids {
            body.put_u16_le(*id);
        }
        if self.channel_ids.len() % 2 == 1 {
            body.put_u16_le(0);
        }
        wrap_block(SC_NET, &body)
    }
}

fn wrap_block(block_type: u16, body: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE + body.len());
    write_block_header(block_type, body.len(), &mut out)?;
    out.put_slice(body);
    Ok(out)
}

/// A server user data block, classified by its type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerBlock {
    /// `SC_CORE`
    Core(ServerCoreData),
    /// `SC_SECURITY`
    Security(ServerSecurityData),
    /// `SC_NET`
    Network(ServerNetworkData),
    /// Any other block type, left undecoded
    Unrecognized {
        /// Block type
        tag: u16,
        /// Block body without header
        data: Bytes,
    },
}

impl ServerBlock {
    /// Decode the body of a block with type `tag`
    ///
    /// Unknown tags never touch the body.
    pub fn decode(tag: u16, body: Bytes) -> Result<Self> {
        Ok(match tag {
            SC_CORE => Self::Core(ServerCoreData::decode(body)?),
            SC_SECURITY => Self::Security(ServerSecurityData::decode(body)?),
            SC_NET => Self::Network(ServerNetworkData::decode(body)?),
            _ => Self::Unrecognized { tag, data: body },
        })
    }
}

/// Iterator over the `(type, body)` pairs of a user data buffer
///
/// Each header is validated only when its block is reached, and the
/// iterator yields nothing further after an error.
#[derive(Debug, Clone)]
pub struct Blocks {
    data: Bytes,
}

impl Iterator for Blocks {
    type Item = Result<(u16, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let block = next_block(&mut self.data);
        if block.is_err() {
            self.data.clear();
        }
        Some(block)
    }
}

fn next_block(data: &mut Bytes) -> Result<(u16, Bytes)> {
    let block_type = read_u16_le(data)?;
    let len = usize::from(read_u16_le(data)?);
    if len < BLOCK_HEADER_SIZE || len - BLOCK_HEADER_SIZE > data.len() {
        return Err(Error::InvalidBlockLength { block_type, len });
    }
    Ok((block_type, data.split_to(len - BLOCK_HEADER_SIZE)))
}

/// Walk a user data buffer block by block
#[must_use]
pub fn blocks(data: Bytes) -> Blocks {
    Blocks { data }
}

/// Split a user data buffer into `(type, body)` pairs
pub fn split_blocks(data: Bytes) -> Result<Vec<(u16, Bytes)>> {
    blocks(data).collect()
}

/// Decode every server user data block in the order they appear
pub fn read_server_blocks(data: Bytes) -> Result<Vec<ServerBlock>> {
    blocks(data)
        .map(|block| block.and_then(|(tag, body)| ServerBlock::decode(tag, body)))
        .collect()
}

/// Wrap client user data blocks in a T.124 Conference Create Request
pub fn write_conference_create_request(user_data: &[u8]) -> Result<Vec<u8>> {
    let mut inner = Vec::with_capacity(16 + user_data.len());
    per::write_choice(0, &mut inner);
    per::write_selection(0x08, &mut inner);
    per::write_numeric_string("1", 1, &mut inner)?;
    per::write_padding(1, &mut inner);
    per::write_number_of_set(1, &mut inner);
    per::write_choice(0xC0, &mut inner);
    per::write_octet_stream(H221_CS_KEY, 4, &mut inner)?;
    per::write_octet_stream(user_data, 0, &mut inner)?;

    let mut out = Vec::with_capacity(10 + inner.len());
    per::write_choice(0, &mut out);
    per::write_object_identifier(&T124_02_98_OID, &mut out);
    per::write_length(inner.len(), &mut out)?;
    out.put_slice(&inner);
    Ok(out)
}

/// Unwrap a T.124 Conference Create Request, returning the client blocks
pub fn read_conference_create_request(mut data: Bytes) -> Result<Bytes> {
    per::read_choice(&mut data)?;
    per::read_object_identifier(&mut data, &T124_02_98_OID)?;
    per::read_length(&mut data)?;
    per::read_choice(&mut data)?;
    // selection
    per::read_choice(&mut data)?;
    // conference name: numeric string "1" plus padding
    let name_len = per::read_length(&mut data)? + 1;
    read_bytes(&mut data, name_len.div_ceil(2) + 1)?;
    per::read_number_of_set(&mut data)?;
    per::read_choice(&mut data)?;
    per::read_octet_stream(&mut data, H221_CS_KEY, 4)?;
    let len = per::read_length(&mut data)?;
    read_bytes(&mut data, len)
}

/// Wrap server user data blocks in a T.124 Conference Create Response
pub fn write_conference_create_response(user_data: &[u8]) -> Result<Vec<u8>> {
    let mut inner = Vec::with_capacity(16 + user_data.len());
    per::write_choice(0x14, &mut inner);
    // node id, encoded relative to the 1001 minimum
    inner.put_u16(0x760A);
    per::write_integer(1, &mut inner);
    per::write_enumerated(0, &mut inner);
    per::write_number_of_set(1, &mut inner);
    per::write_choice(0xC0, &mut inner);
    per::write_octet_stream(H221_SC_KEY, 4, &mut inner)?;
    per::write_octet_stream(user_data, 0, &mut inner)?;

    let mut out = Vec::with_capacity(10 + inner.len());
    per::write_choice(0, &mut out);
    per::write_object_identifier(&T124_02_98_OID, &mut out);
    per::write_length(inner.len(), &mut out)?;
    out.put_slice(&inner);
    Ok(out)
}

/// Unwrap a T.124 Conference Create Response, returning the server blocks
///
/// The blocks are left undecoded; walk them with [`blocks`].
pub fn read_conference_create_response(mut data: Bytes) -> Result<Bytes> {
    per::read_choice(&mut data)?;
    per::read_object_identifier(&mut data, &T124_02_98_OID)?;
    // servers are known to send a bogus length here; it is not checked
    per::read_length(&mut data)?;
    per::read_choice(&mut data)?;
    per::read_integer16(&mut data, 1001)?;
    per::read_integer(&mut data)?;
    per::read_enumerated(&mut data)?;
    per::read_number_of_set(&mut data)?;
    per::read_choice(&mut data)?;
    per::read_octet_stream(&mut data, H221_SC_KEY, 4)?;
    let len = per::read_length(&mut data)?;
    read_bytes(&mut data, len)
}
